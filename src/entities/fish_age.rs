use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Reference table of fish age classes (fry, fingerling, two-summer, ...).
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "fish_ages")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub name: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::fish_batch::Entity")]
    FishBatch,
}

impl Related<super::fish_batch::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::FishBatch.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
