use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue, Set};
use serde::{Deserialize, Serialize};

/// A planned or executed release of fish into a water body.
///
/// There is deliberately no persisted status column: the lifecycle state is
/// derived from the timestamps, batch review data and signatures on every
/// read (see `services::status`).
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "stocking_events")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    pub event_time: DateTime<Utc>,
    pub review_time: Option<DateTime<Utc>>,
    pub canceled_at: Option<DateTime<Utc>>,

    /// "GROWN" or "CAUGHT"; exactly one of the two companion fields below is
    /// populated, enforced by the lifecycle validator.
    pub fish_origin: String,
    pub fish_origin_company_name: Option<String>,
    pub fish_origin_reservoir: Option<String>,

    /// Owning organization; absent for freelancer-owned events.
    pub tenant_id: Option<i64>,
    /// Organization on whose behalf the stocking is done, if any.
    pub stocking_customer_id: Option<i64>,
    pub created_by: i64,
    pub assigned_to: i64,
    /// Set together with `review_time`, never separately.
    pub reviewed_by: Option<i64>,

    pub assigned_inspector_id: Option<i64>,
    /// Point-in-time copy of the inspector's profile taken at assignment;
    /// intentionally not kept in sync with the live person row.
    pub inspector: Option<Json>,

    // Denormalized water-body descriptor.
    pub reservoir_cadastral_id: Option<String>,
    pub reservoir_name: String,
    pub municipality: Option<String>,
    pub reservoir_area: Option<f64>,
    pub reservoir_length: Option<f64>,
    pub reservoir_category: Option<String>,
    pub geom_x: f64,
    pub geom_y: f64,

    // Review/inspection artifacts.
    /// Array of {organization, signed_by, signature}; non-empty only once
    /// the event has been countersigned by an inspector.
    pub signatures: Option<Json>,
    pub waybill_no: Option<String>,
    pub vet_approval_no: Option<String>,
    pub vet_certificate_no: Option<String>,
    pub water_temp: Option<f64>,
    pub transport_water_temp: Option<f64>,

    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::fish_batch::Entity")]
    FishBatch,
    #[sea_orm(
        belongs_to = "super::tenant::Entity",
        from = "Column::TenantId",
        to = "super::tenant::Column::Id"
    )]
    Tenant,
}

impl Related<super::fish_batch::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::FishBatch.def()
    }
}

impl Related<super::tenant::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Tenant.def()
    }
}

impl Model {
    /// True when the stored signatures array exists and is non-empty.
    pub fn has_signatures(&self) -> bool {
        self.signatures
            .as_ref()
            .and_then(|v| v.as_array())
            .map(|arr| !arr.is_empty())
            .unwrap_or(false)
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
