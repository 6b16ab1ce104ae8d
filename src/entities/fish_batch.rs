use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue, Set};
use serde::{Deserialize, Serialize};

/// One line item of a stocking event: a fish species/age class with a planned
/// quantity and, once the event has been reviewed, the actual released
/// quantity.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "fish_batches")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub fish_stocking_id: i64,
    pub fish_type_id: i64,
    pub fish_age_id: i64,
    /// Planned count of fish.
    pub amount: i32,
    /// Planned total weight in kilograms.
    pub weight: Option<f64>,
    /// Actual released count, filled during review. A populated value, zero
    /// included, marks the batch as reviewed.
    pub review_amount: Option<i32>,
    pub review_weight: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::stocking_event::Entity",
        from = "Column::FishStockingId",
        to = "super::stocking_event::Column::Id"
    )]
    StockingEvent,
    #[sea_orm(
        belongs_to = "super::fish_type::Entity",
        from = "Column::FishTypeId",
        to = "super::fish_type::Column::Id"
    )]
    FishType,
    #[sea_orm(
        belongs_to = "super::fish_age::Entity",
        from = "Column::FishAgeId",
        to = "super::fish_age::Column::Id"
    )]
    FishAge,
}

impl Related<super::stocking_event::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StockingEvent.def()
    }
}

impl Related<super::fish_type::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::FishType.def()
    }
}

impl Related<super::fish_age::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::FishAge.def()
    }
}

impl Model {
    /// A batch counts as reviewed as soon as `review_amount` is populated,
    /// zero included (a planned species that ultimately wasn't released).
    pub fn is_reviewed(&self) -> bool {
        self.review_amount.is_some()
    }
}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C: ConnectionTrait>(self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let mut active_model = self;
        let now = Utc::now();

        if insert {
            if let ActiveValue::NotSet = active_model.created_at {
                active_model.created_at = Set(now);
            }
        }
        active_model.updated_at = Set(Some(now));

        Ok(active_model)
    }
}
