use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Single-row global configuration read on every status derivation and
/// registration/deletion window check.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "settings")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Minimum lead time in days between registration and the event date.
    pub min_time_till_stocking: i32,
    /// Number of days after the event date during which review edits remain
    /// possible.
    pub max_time_for_registration: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
