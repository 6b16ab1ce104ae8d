use std::collections::HashSet;

use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use validator::Validate;

use crate::{
    entities::fish_batch::{self, Entity as FishBatchEntity},
    errors::ServiceError,
};

/// One desired batch line. Entries with an id update the matching persisted
/// row; entries without an id are created; persisted rows absent from the
/// desired set are deleted.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct BatchInput {
    pub id: Option<i64>,
    pub fish_type_id: i64,
    pub fish_age_id: i64,
    #[validate(range(min = 0, message = "Amount must be non-negative"))]
    pub amount: i32,
    #[validate(range(min = 0.0, message = "Weight must be non-negative"))]
    pub weight: Option<f64>,
    #[validate(range(min = 0, message = "Review amount must be non-negative"))]
    pub review_amount: Option<i32>,
    #[validate(range(min = 0.0, message = "Review weight must be non-negative"))]
    pub review_weight: Option<f64>,
}

impl From<&fish_batch::Model> for BatchInput {
    fn from(model: &fish_batch::Model) -> Self {
        Self {
            id: Some(model.id),
            fish_type_id: model.fish_type_id,
            fish_age_id: model.fish_age_id,
            amount: model.amount,
            weight: model.weight,
            review_amount: model.review_amount,
            review_weight: model.review_weight,
        }
    }
}

/// Minimal create/update/delete set turning the persisted batches into the
/// desired ones.
#[derive(Debug, Clone, Default)]
pub struct ReconcilePlan {
    pub create: Vec<BatchInput>,
    pub update: Vec<BatchInput>,
    pub delete: Vec<i64>,
}

impl ReconcilePlan {
    pub fn is_noop(&self) -> bool {
        self.create.is_empty() && self.update.is_empty() && self.delete.is_empty()
    }
}

/// Computes the diff between persisted and desired batches.
///
/// Desired entries referencing an id that is not among the persisted rows
/// are rejected; the reconciler never adopts rows from another event.
pub fn plan(
    existing: &[fish_batch::Model],
    desired: &[BatchInput],
) -> Result<ReconcilePlan, ServiceError> {
    let existing_ids: HashSet<i64> = existing.iter().map(|b| b.id).collect();
    let mut seen: HashSet<i64> = HashSet::new();
    let mut plan = ReconcilePlan::default();

    for input in desired {
        match input.id {
            Some(id) => {
                if !existing_ids.contains(&id) {
                    return Err(ServiceError::NotFound(format!(
                        "Fish batch {id} does not belong to this stocking event"
                    )));
                }
                if !seen.insert(id) {
                    return Err(ServiceError::ValidationError(format!(
                        "Fish batch {id} appears more than once"
                    )));
                }
                plan.update.push(input.clone());
            }
            None => plan.create.push(input.clone()),
        }
    }

    plan.delete = existing
        .iter()
        .map(|b| b.id)
        .filter(|id| !seen.contains(id))
        .collect();

    Ok(plan)
}

/// Applies the desired batch set to the persisted one.
///
/// Runs on the caller's connection, which in practice is the enclosing
/// lifecycle operation's transaction, so a failed step leaves no partial
/// application visible. Returns the full persisted set after the changes.
#[instrument(skip(conn, existing, desired), fields(event_id = event_id))]
pub async fn reconcile<C: ConnectionTrait>(
    conn: &C,
    event_id: i64,
    existing: &[fish_batch::Model],
    desired: &[BatchInput],
) -> Result<Vec<fish_batch::Model>, ServiceError> {
    for input in desired {
        input.validate()?;
    }

    let plan = plan(existing, desired)?;
    debug!(
        creates = plan.create.len(),
        updates = plan.update.len(),
        deletes = plan.delete.len(),
        "Reconciling fish batches"
    );

    if !plan.delete.is_empty() {
        FishBatchEntity::delete_many()
            .filter(fish_batch::Column::FishStockingId.eq(event_id))
            .filter(fish_batch::Column::Id.is_in(plan.delete.clone()))
            .exec(conn)
            .await?;
    }

    for input in &plan.update {
        let id = input
            .id
            .ok_or_else(|| ServiceError::InternalError("update entry without id".to_string()))?;
        let active = fish_batch::ActiveModel {
            id: Set(id),
            fish_stocking_id: Set(event_id),
            fish_type_id: Set(input.fish_type_id),
            fish_age_id: Set(input.fish_age_id),
            amount: Set(input.amount),
            weight: Set(input.weight),
            review_amount: Set(input.review_amount),
            review_weight: Set(input.review_weight),
            ..Default::default()
        };
        active.update(conn).await?;
    }

    for input in &plan.create {
        let active = fish_batch::ActiveModel {
            fish_stocking_id: Set(event_id),
            fish_type_id: Set(input.fish_type_id),
            fish_age_id: Set(input.fish_age_id),
            amount: Set(input.amount),
            weight: Set(input.weight),
            review_amount: Set(input.review_amount),
            review_weight: Set(input.review_weight),
            ..Default::default()
        };
        active.insert(conn).await?;
    }

    let applied = FishBatchEntity::find()
        .filter(fish_batch::Column::FishStockingId.eq(event_id))
        .order_by_asc(fish_batch::Column::Id)
        .all(conn)
        .await?;

    Ok(applied)
}
