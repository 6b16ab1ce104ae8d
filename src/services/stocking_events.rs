use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument, warn};
use validator::Validate;

use crate::{
    auth::{Actor, ActorKind},
    entities::{
        fish_batch::{self, Entity as FishBatchEntity},
        person::{self, Entity as PersonEntity},
        stocking_event::{self, Entity as StockingEventEntity},
        tenant::Entity as TenantEntity,
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::{
        batch_reconciler::{self, BatchInput},
        geometry::{Coordinates, GeometryConverter},
        reference_data,
        settings::SettingsService,
        status::{days_until_event, derive_status, StockingSettings, StockingStatus},
    },
};

pub const FISH_ORIGIN_GROWN: &str = "GROWN";
pub const FISH_ORIGIN_CAUGHT: &str = "CAUGHT";

/// Denormalized inspector profile stored on the event at assignment time.
/// A point-in-time copy: later edits to the inspector's person row do not
/// propagate here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InspectorSnapshot {
    pub name: String,
    pub authority: Option<String>,
    pub email: String,
    pub phone: Option<String>,
}

impl InspectorSnapshot {
    pub fn from_person(p: &person::Model) -> Self {
        Self {
            name: p.full_name(),
            authority: p.authority.clone(),
            email: p.email.clone(),
            phone: p.phone.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RegisterStockingRequest {
    pub event_time: DateTime<Utc>,
    pub fish_origin: String,
    pub fish_origin_company_name: Option<String>,
    pub fish_origin_reservoir: Option<String>,
    /// Honored for admins only; other actors get their own affiliation.
    pub tenant_id: Option<i64>,
    pub stocking_customer_id: Option<i64>,
    pub assigned_to: i64,
    pub reservoir_cadastral_id: Option<String>,
    #[validate(length(min = 1, message = "Reservoir name is required"))]
    pub reservoir_name: String,
    pub municipality: Option<String>,
    pub reservoir_area: Option<f64>,
    pub reservoir_length: Option<f64>,
    pub reservoir_category: Option<String>,
    pub coordinates: Coordinates,
    // Per-batch field validation happens during reconciliation.
    #[validate(length(min = 1, message = "At least one fish batch is required"))]
    pub batches: Vec<BatchInput>,
}

/// Amendment of a planned event. `None` fields are left untouched. While
/// the stocking window is open only `assigned_to` may be present.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateStockingRequest {
    pub event_time: Option<DateTime<Utc>>,
    pub assigned_to: Option<i64>,
    pub stocking_customer_id: Option<i64>,
    pub coordinates: Option<Coordinates>,
    pub batches: Option<Vec<BatchInput>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ReviewStockingRequest {
    #[validate(length(min = 1, message = "At least one fish batch is required"))]
    pub batches: Vec<BatchInput>,
    pub waybill_no: Option<String>,
    pub vet_approval_no: Option<String>,
    pub vet_certificate_no: Option<String>,
    pub water_temp: Option<f64>,
    pub transport_water_temp: Option<f64>,
}

/// Privileged full edit. Not gated by the derived status; every sub-field
/// change is validated independently.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct AdminUpdateStockingRequest {
    pub event_time: Option<DateTime<Utc>>,
    pub fish_origin: Option<String>,
    pub fish_origin_company_name: Option<String>,
    pub fish_origin_reservoir: Option<String>,
    pub stocking_customer_id: Option<i64>,
    pub assigned_to: Option<i64>,
    /// Assigning an inspector rewrites the stored snapshot and queues a
    /// notification to the inspector.
    pub inspector_id: Option<i64>,
    /// Inspection countersignatures, as a JSON array of
    /// {organization, signed_by, signature}.
    pub signatures: Option<serde_json::Value>,
    pub waybill_no: Option<String>,
    pub vet_approval_no: Option<String>,
    pub vet_certificate_no: Option<String>,
    pub water_temp: Option<f64>,
    pub transport_water_temp: Option<f64>,
    pub coordinates: Option<Coordinates>,
    pub batches: Option<Vec<BatchInput>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StockingEventResponse {
    pub id: i64,
    pub status: StockingStatus,
    pub event_time: DateTime<Utc>,
    pub review_time: Option<DateTime<Utc>>,
    pub canceled_at: Option<DateTime<Utc>>,
    pub fish_origin: String,
    pub fish_origin_company_name: Option<String>,
    pub fish_origin_reservoir: Option<String>,
    pub tenant_id: Option<i64>,
    pub stocking_customer_id: Option<i64>,
    pub created_by: i64,
    pub assigned_to: i64,
    pub reviewed_by: Option<i64>,
    pub assigned_inspector_id: Option<i64>,
    pub inspector: Option<serde_json::Value>,
    pub reservoir_cadastral_id: Option<String>,
    pub reservoir_name: String,
    pub municipality: Option<String>,
    pub reservoir_area: Option<f64>,
    pub reservoir_length: Option<f64>,
    pub reservoir_category: Option<String>,
    pub geom_x: f64,
    pub geom_y: f64,
    pub signatures: Option<serde_json::Value>,
    pub waybill_no: Option<String>,
    pub vet_approval_no: Option<String>,
    pub vet_certificate_no: Option<String>,
    pub water_temp: Option<f64>,
    pub transport_water_temp: Option<f64>,
    pub batches: Vec<fish_batch::Model>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StockingEventListResponse {
    pub events: Vec<StockingEventResponse>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
}

/// Outcome of a cancel request: canceling a still-upcoming event removes it
/// outright, since nothing has happened yet and a cancellation record would
/// be meaningless.
#[derive(Debug, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CancelOutcome {
    Canceled(StockingEventResponse),
    Deleted,
}

/// Lifecycle service for stocking events: guards each mutating operation
/// with the derived status, the actor's relationship to the event and the
/// configured timing windows before touching persistence.
#[derive(Clone)]
pub struct StockingEventService {
    db: Arc<DatabaseConnection>,
    settings: SettingsService,
    geometry: Arc<dyn GeometryConverter>,
    event_sender: Option<Arc<EventSender>>,
}

impl StockingEventService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        settings: SettingsService,
        geometry: Arc<dyn GeometryConverter>,
        event_sender: Option<Arc<EventSender>>,
    ) -> Self {
        Self {
            db,
            settings,
            geometry,
            event_sender,
        }
    }

    /// Registers a new stocking event. The event date must be at least
    /// `min_time_till_stocking` days out.
    #[instrument(skip(self, actor, request), fields(actor_id = actor.id))]
    pub async fn register(
        &self,
        actor: &Actor,
        request: RegisterStockingRequest,
    ) -> Result<StockingEventResponse, ServiceError> {
        request.validate()?;
        reject_review_data(&request.batches)?;
        validate_fish_origin(
            &request.fish_origin,
            request.fish_origin_company_name.as_deref(),
            request.fish_origin_reservoir.as_deref(),
        )?;

        let settings = self.settings.get().await?;
        let now = Utc::now();
        if days_until_event(now, request.event_time) < i64::from(settings.min_time_till_stocking) {
            return Err(ServiceError::InvalidEventTime(format!(
                "Stocking must be registered at least {} days before the event",
                settings.min_time_till_stocking
            )));
        }

        let tenant_id = match actor.kind {
            ActorKind::Admin => request.tenant_id,
            ActorKind::TenantMember => actor.tenant_id,
            ActorKind::Freelancer => None,
            ActorKind::Inspector => {
                return Err(ServiceError::NoRights(
                    "inspectors cannot register stocking events".to_string(),
                ))
            }
        };

        let assignee = self.validate_assignee(&*self.db, request.assigned_to).await?;
        self.validate_stocking_customer(&*self.db, request.stocking_customer_id)
            .await?;
        self.validate_batch_references(&*self.db, &request.batches)
            .await?;
        let point = self.geometry.to_point(request.coordinates)?;

        let txn = self.db.begin().await?;

        let active = stocking_event::ActiveModel {
            event_time: Set(request.event_time),
            fish_origin: Set(request.fish_origin.clone()),
            fish_origin_company_name: Set(request.fish_origin_company_name.clone()),
            fish_origin_reservoir: Set(request.fish_origin_reservoir.clone()),
            tenant_id: Set(tenant_id),
            stocking_customer_id: Set(request.stocking_customer_id),
            created_by: Set(actor.id),
            assigned_to: Set(request.assigned_to),
            reservoir_cadastral_id: Set(request.reservoir_cadastral_id.clone()),
            reservoir_name: Set(request.reservoir_name.clone()),
            municipality: Set(request.municipality.clone()),
            reservoir_area: Set(request.reservoir_area),
            reservoir_length: Set(request.reservoir_length),
            reservoir_category: Set(request.reservoir_category.clone()),
            geom_x: Set(point.x),
            geom_y: Set(point.y),
            ..Default::default()
        };
        let event = active.insert(&txn).await?;

        let batches = batch_reconciler::reconcile(&txn, event.id, &[], &request.batches).await?;

        txn.commit().await?;

        info!(event_id = event.id, "Stocking event registered");

        self.send_event(Event::StockingSaved {
            event_id: event.id,
            reservoir_name: event.reservoir_name.clone(),
            recipients: dedup_recipients(&[assignee.email.as_str(), actor.email.as_str()]),
            is_update: false,
        })
        .await;

        self.to_response(event, batches, &settings, Utc::now())
    }

    /// Fetches one event with its batches and derived status.
    #[instrument(skip(self, actor), fields(event_id = id))]
    pub async fn get(&self, actor: &Actor, id: i64) -> Result<StockingEventResponse, ServiceError> {
        let (event, batches) = load_event(&*self.db, id).await?;
        ensure_can_view(actor, &event)?;
        let settings = self.settings.get().await?;
        self.to_response(event, batches, &settings, Utc::now())
    }

    /// Lists events visible to the actor, newest event date first.
    #[instrument(skip(self, actor))]
    pub async fn list(
        &self,
        actor: &Actor,
        page: u64,
        per_page: u64,
    ) -> Result<StockingEventListResponse, ServiceError> {
        let page = page.max(1);
        let per_page = per_page.clamp(1, 100);

        let mut query = StockingEventEntity::find();
        match actor.kind {
            ActorKind::Admin | ActorKind::Inspector => {}
            ActorKind::TenantMember => {
                query = query.filter(
                    Condition::any()
                        .add(stocking_event::Column::TenantId.eq(actor.tenant_id))
                        .add(stocking_event::Column::StockingCustomerId.eq(actor.tenant_id)),
                );
            }
            ActorKind::Freelancer => {
                query = query.filter(
                    Condition::any()
                        .add(stocking_event::Column::CreatedBy.eq(actor.id))
                        .add(stocking_event::Column::AssignedTo.eq(actor.id)),
                );
            }
        }

        let paginator = query
            .order_by_desc(stocking_event::Column::EventTime)
            .paginate(&*self.db, per_page);
        let total = paginator.num_items().await?;
        let events = paginator.fetch_page(page - 1).await?;

        let ids: Vec<i64> = events.iter().map(|e| e.id).collect();
        let mut batches_by_event: HashMap<i64, Vec<fish_batch::Model>> = HashMap::new();
        if !ids.is_empty() {
            let all_batches = FishBatchEntity::find()
                .filter(fish_batch::Column::FishStockingId.is_in(ids))
                .order_by_asc(fish_batch::Column::Id)
                .all(&*self.db)
                .await?;
            for batch in all_batches {
                batches_by_event
                    .entry(batch.fish_stocking_id)
                    .or_default()
                    .push(batch);
            }
        }

        let settings = self.settings.get().await?;
        let now = Utc::now();
        let mut responses = Vec::with_capacity(events.len());
        for event in events {
            let batches = batches_by_event.remove(&event.id).unwrap_or_default();
            responses.push(self.to_response(event, batches, &settings, now)?);
        }

        Ok(StockingEventListResponse {
            events: responses,
            total,
            page,
            per_page,
        })
    }

    /// Amends a planned event. Full edits are possible while UPCOMING; once
    /// the stocking window has opened only the assignee may change.
    #[instrument(skip(self, actor, request), fields(event_id = id, actor_id = actor.id))]
    pub async fn update_registration(
        &self,
        actor: &Actor,
        id: i64,
        request: UpdateStockingRequest,
    ) -> Result<StockingEventResponse, ServiceError> {
        request.validate()?;
        let settings = self.settings.get().await?;
        let now = Utc::now();

        let txn = self.db.begin().await?;
        let (event, batches) = load_event(&txn, id).await?;
        ensure_can_modify(actor, &event)?;

        let status = self.derive_or_err(&event, &batches, &settings, now)?;

        let (event, batches) = match status {
            StockingStatus::Upcoming => {
                if let Some(event_time) = request.event_time {
                    if days_until_event(now, event_time)
                        < i64::from(settings.min_time_till_stocking)
                    {
                        return Err(ServiceError::InvalidEventTime(format!(
                            "Stocking must be registered at least {} days before the event",
                            settings.min_time_till_stocking
                        )));
                    }
                }
                if let Some(assigned_to) = request.assigned_to {
                    self.validate_assignee(&txn, assigned_to).await?;
                }
                if request.stocking_customer_id.is_some() {
                    self.validate_stocking_customer(&txn, request.stocking_customer_id)
                        .await?;
                }
                if let Some(desired) = &request.batches {
                    reject_review_data(desired)?;
                    self.validate_batch_references(&txn, desired).await?;
                }

                let mut active: stocking_event::ActiveModel = event.into();
                if let Some(event_time) = request.event_time {
                    active.event_time = Set(event_time);
                }
                if let Some(assigned_to) = request.assigned_to {
                    active.assigned_to = Set(assigned_to);
                }
                if let Some(customer) = request.stocking_customer_id {
                    active.stocking_customer_id = Set(Some(customer));
                }
                if let Some(coordinates) = request.coordinates {
                    let point = self.geometry.to_point(coordinates)?;
                    active.geom_x = Set(point.x);
                    active.geom_y = Set(point.y);
                }
                let event = active.update(&txn).await?;

                let batches = match &request.batches {
                    Some(desired) => {
                        batch_reconciler::reconcile(&txn, event.id, &batches, desired).await?
                    }
                    None => batches,
                };
                (event, batches)
            }
            StockingStatus::Ongoing => {
                // Every field except the assignee is frozen mid-window.
                if request.event_time.is_some()
                    || request.stocking_customer_id.is_some()
                    || request.coordinates.is_some()
                    || request.batches.is_some()
                {
                    return Err(ServiceError::ValidationError(
                        "Only the assignee can be changed while the stocking window is open"
                            .to_string(),
                    ));
                }
                let assigned_to = request.assigned_to.ok_or_else(|| {
                    ServiceError::ValidationError("Nothing to update".to_string())
                })?;
                self.validate_assignee(&txn, assigned_to).await?;

                let mut active: stocking_event::ActiveModel = event.into();
                active.assigned_to = Set(assigned_to);
                let event = active.update(&txn).await?;
                (event, batches)
            }
            other => {
                return Err(ServiceError::InvalidStatus(format!(
                    "Registration can no longer be changed in status {other}"
                )))
            }
        };

        txn.commit().await?;

        info!(event_id = event.id, "Stocking registration updated");

        let recipients = self.modification_recipients(actor, &event).await?;
        self.send_event(Event::StockingSaved {
            event_id: event.id,
            reservoir_name: event.reservoir_name.clone(),
            recipients,
            is_update: true,
        })
        .await;

        self.to_response(event, batches, &settings, Utc::now())
    }

    /// Submits post-event results. Permitted only while the stocking window
    /// is open; stamps `review_time`/`reviewed_by` together once the batch
    /// review data has been reconciled.
    #[instrument(skip(self, actor, request), fields(event_id = id, actor_id = actor.id))]
    pub async fn review(
        &self,
        actor: &Actor,
        id: i64,
        request: ReviewStockingRequest,
    ) -> Result<StockingEventResponse, ServiceError> {
        request.validate()?;
        for batch in &request.batches {
            if batch.review_amount.is_none() {
                return Err(ServiceError::ValidationError(
                    "Every batch in a review must carry a reviewed amount".to_string(),
                ));
            }
        }

        let settings = self.settings.get().await?;
        let now = Utc::now();

        let txn = self.db.begin().await?;
        let (event, batches) = load_event(&txn, id).await?;
        ensure_can_modify(actor, &event)?;

        let status = self.derive_or_err(&event, &batches, &settings, now)?;
        if status != StockingStatus::Ongoing {
            return Err(ServiceError::InvalidStatus(format!(
                "Review is only possible during the stocking window, current status is {status}"
            )));
        }

        self.validate_batch_references(&txn, &request.batches)
            .await?;
        let batches = batch_reconciler::reconcile(&txn, event.id, &batches, &request.batches).await?;

        let mut active: stocking_event::ActiveModel = event.into();
        active.review_time = Set(Some(now));
        active.reviewed_by = Set(Some(actor.id));
        if request.waybill_no.is_some() {
            active.waybill_no = Set(request.waybill_no.clone());
        }
        if request.vet_approval_no.is_some() {
            active.vet_approval_no = Set(request.vet_approval_no.clone());
        }
        if request.vet_certificate_no.is_some() {
            active.vet_certificate_no = Set(request.vet_certificate_no.clone());
        }
        if request.water_temp.is_some() {
            active.water_temp = Set(request.water_temp);
        }
        if request.transport_water_temp.is_some() {
            active.transport_water_temp = Set(request.transport_water_temp);
        }
        let event = active.update(&txn).await?;

        txn.commit().await?;

        info!(event_id = event.id, "Stocking review submitted");

        self.to_response(event, batches, &settings, Utc::now())
    }

    /// Cancels an event. UPCOMING events are removed outright; ONGOING and
    /// NOT_FINISHED events are stamped with `canceled_at`. Reviewed or
    /// already-canceled events cannot be canceled.
    #[instrument(skip(self, actor), fields(event_id = id, actor_id = actor.id))]
    pub async fn cancel(&self, actor: &Actor, id: i64) -> Result<CancelOutcome, ServiceError> {
        let settings = self.settings.get().await?;
        let now = Utc::now();

        let txn = self.db.begin().await?;
        let (event, batches) = load_event(&txn, id).await?;
        ensure_can_modify(actor, &event)?;

        let status = self.derive_or_err(&event, &batches, &settings, now)?;
        match status {
            StockingStatus::Upcoming => {
                let event_id = event.id;
                FishBatchEntity::delete_many()
                    .filter(fish_batch::Column::FishStockingId.eq(event_id))
                    .exec(&txn)
                    .await?;
                StockingEventEntity::delete_by_id(event_id).exec(&txn).await?;
                txn.commit().await?;

                info!(event_id, "Upcoming stocking event canceled and removed");
                self.send_event(Event::StockingDeleted { event_id }).await;
                Ok(CancelOutcome::Deleted)
            }
            StockingStatus::Ongoing | StockingStatus::NotFinished => {
                let mut active: stocking_event::ActiveModel = event.into();
                active.canceled_at = Set(Some(now));
                let event = active.update(&txn).await?;
                txn.commit().await?;

                info!(event_id = event.id, "Stocking event canceled");
                self.send_event(Event::StockingCanceled { event_id: event.id })
                    .await;
                let response = self.to_response(event, batches, &settings, Utc::now())?;
                Ok(CancelOutcome::Canceled(response))
            }
            other => Err(ServiceError::InvalidStatus(format!(
                "Cannot cancel a stocking event in status {other}"
            ))),
        }
    }

    /// Removes an event outright. Permitted for the owner or an admin, and
    /// only while the event date is still more than `min_time_till_stocking`
    /// days away, regardless of derived status.
    #[instrument(skip(self, actor), fields(event_id = id, actor_id = actor.id))]
    pub async fn delete(&self, actor: &Actor, id: i64) -> Result<(), ServiceError> {
        let settings = self.settings.get().await?;
        let now = Utc::now();

        let txn = self.db.begin().await?;
        let (event, _batches) = load_event(&txn, id).await?;
        ensure_can_modify(actor, &event)?;

        if days_until_event(now, event.event_time) <= i64::from(settings.min_time_till_stocking) {
            return Err(ServiceError::AfterPermittedDeletionTime);
        }

        let event_id = event.id;
        FishBatchEntity::delete_many()
            .filter(fish_batch::Column::FishStockingId.eq(event_id))
            .exec(&txn)
            .await?;
        StockingEventEntity::delete_by_id(event_id).exec(&txn).await?;
        txn.commit().await?;

        info!(event_id, "Stocking event deleted");
        self.send_event(Event::StockingDeleted { event_id }).await;
        Ok(())
    }

    /// Privileged full edit, including inspector assignment and signature
    /// attachment. Not gated by status; each sub-field change is validated
    /// on its own.
    #[instrument(skip(self, actor, request), fields(event_id = id, actor_id = actor.id))]
    pub async fn admin_update(
        &self,
        actor: &Actor,
        id: i64,
        request: AdminUpdateStockingRequest,
    ) -> Result<StockingEventResponse, ServiceError> {
        actor.require_admin()?;
        request.validate()?;

        let settings = self.settings.get().await?;

        let txn = self.db.begin().await?;
        let (event, batches) = load_event(&txn, id).await?;

        if let Some(origin) = &request.fish_origin {
            let company = request
                .fish_origin_company_name
                .as_deref()
                .or(event.fish_origin_company_name.as_deref());
            let reservoir = request
                .fish_origin_reservoir
                .as_deref()
                .or(event.fish_origin_reservoir.as_deref());
            validate_fish_origin(origin, company, reservoir)?;
        }
        if let Some(assigned_to) = request.assigned_to {
            self.validate_assignee(&txn, assigned_to).await?;
        }
        if request.stocking_customer_id.is_some() {
            self.validate_stocking_customer(&txn, request.stocking_customer_id)
                .await?;
        }
        if let Some(desired) = &request.batches {
            // Review data may only be corrected once a review exists;
            // before that it would fabricate a FINISHED event.
            if event.review_time.is_none() {
                reject_review_data(desired)?;
            }
            self.validate_batch_references(&txn, desired).await?;
        }
        if let Some(signatures) = &request.signatures {
            if !signatures.is_array() {
                return Err(ServiceError::ValidationError(
                    "Signatures must be an array".to_string(),
                ));
            }
        }

        // Inspector assignment copies the live profile into the event; the
        // stored snapshot goes stale by design.
        let newly_assigned_inspector = match request.inspector_id {
            Some(inspector_id) if event.assigned_inspector_id != Some(inspector_id) => {
                let inspector = PersonEntity::find_by_id(inspector_id)
                    .one(&txn)
                    .await?
                    .filter(|p| p.is_inspector())
                    .ok_or(ServiceError::InvalidAssignedTo(inspector_id))?;
                Some(inspector)
            }
            _ => None,
        };

        let mut active: stocking_event::ActiveModel = event.into();
        if let Some(event_time) = request.event_time {
            active.event_time = Set(event_time);
        }
        if let Some(origin) = request.fish_origin.clone() {
            active.fish_origin = Set(origin);
        }
        if request.fish_origin_company_name.is_some() {
            active.fish_origin_company_name = Set(request.fish_origin_company_name.clone());
        }
        if request.fish_origin_reservoir.is_some() {
            active.fish_origin_reservoir = Set(request.fish_origin_reservoir.clone());
        }
        if let Some(customer) = request.stocking_customer_id {
            active.stocking_customer_id = Set(Some(customer));
        }
        if let Some(assigned_to) = request.assigned_to {
            active.assigned_to = Set(assigned_to);
        }
        if let Some(inspector) = &newly_assigned_inspector {
            active.assigned_inspector_id = Set(Some(inspector.id));
            let snapshot = serde_json::to_value(InspectorSnapshot::from_person(inspector))
                .map_err(|e| ServiceError::InternalError(e.to_string()))?;
            active.inspector = Set(Some(snapshot));
        }
        if let Some(signatures) = request.signatures.clone() {
            active.signatures = Set(Some(signatures));
        }
        if request.waybill_no.is_some() {
            active.waybill_no = Set(request.waybill_no.clone());
        }
        if request.vet_approval_no.is_some() {
            active.vet_approval_no = Set(request.vet_approval_no.clone());
        }
        if request.vet_certificate_no.is_some() {
            active.vet_certificate_no = Set(request.vet_certificate_no.clone());
        }
        if request.water_temp.is_some() {
            active.water_temp = Set(request.water_temp);
        }
        if request.transport_water_temp.is_some() {
            active.transport_water_temp = Set(request.transport_water_temp);
        }
        if let Some(coordinates) = request.coordinates {
            let point = self.geometry.to_point(coordinates)?;
            active.geom_x = Set(point.x);
            active.geom_y = Set(point.y);
        }
        let event = active.update(&txn).await?;

        let batches = match &request.batches {
            Some(desired) => batch_reconciler::reconcile(&txn, event.id, &batches, desired).await?,
            None => batches,
        };

        txn.commit().await?;

        info!(event_id = event.id, "Stocking event updated by admin");

        if let Some(inspector) = &newly_assigned_inspector {
            self.send_event(Event::InspectorAssigned {
                event_id: event.id,
                reservoir_name: event.reservoir_name.clone(),
                recipient: inspector.email.clone(),
            })
            .await;
        }
        let recipients = self.modification_recipients(actor, &event).await?;
        self.send_event(Event::StockingSaved {
            event_id: event.id,
            reservoir_name: event.reservoir_name.clone(),
            recipients,
            is_update: true,
        })
        .await;

        self.to_response(event, batches, &settings, Utc::now())
    }

    async fn validate_assignee<C: ConnectionTrait>(
        &self,
        conn: &C,
        person_id: i64,
    ) -> Result<person::Model, ServiceError> {
        PersonEntity::find_by_id(person_id)
            .one(conn)
            .await?
            .ok_or(ServiceError::InvalidAssignedTo(person_id))
    }

    async fn validate_stocking_customer<C: ConnectionTrait>(
        &self,
        conn: &C,
        tenant_id: Option<i64>,
    ) -> Result<(), ServiceError> {
        if let Some(tenant_id) = tenant_id {
            TenantEntity::find_by_id(tenant_id)
                .one(conn)
                .await?
                .ok_or(ServiceError::InvalidStockingCustomer(tenant_id))?;
        }
        Ok(())
    }

    /// Species/age referential validity is a precondition of reconciliation.
    async fn validate_batch_references<C: ConnectionTrait>(
        &self,
        conn: &C,
        batches: &[BatchInput],
    ) -> Result<(), ServiceError> {
        for batch in batches {
            if !reference_data::fish_type_exists(conn, batch.fish_type_id).await? {
                return Err(ServiceError::InvalidFishType(batch.fish_type_id));
            }
            if !reference_data::fish_age_exists(conn, batch.fish_age_id).await? {
                return Err(ServiceError::InvalidFishAge(batch.fish_age_id));
            }
        }
        Ok(())
    }

    fn derive_or_err(
        &self,
        event: &stocking_event::Model,
        batches: &[fish_batch::Model],
        settings: &StockingSettings,
        now: DateTime<Utc>,
    ) -> Result<StockingStatus, ServiceError> {
        derive_status(event, batches, settings, now).ok_or_else(|| {
            error!(
                event_id = event.id,
                event_time = %event.event_time,
                %now,
                "Stocking event matched no lifecycle status"
            );
            ServiceError::InternalError(format!(
                "could not derive a lifecycle status for stocking event {}",
                event.id
            ))
        })
    }

    async fn modification_recipients(
        &self,
        actor: &Actor,
        event: &stocking_event::Model,
    ) -> Result<Vec<String>, ServiceError> {
        let mut recipients = vec![actor.email.clone()];
        if let Some(assignee) = PersonEntity::find_by_id(event.assigned_to)
            .one(&*self.db)
            .await?
        {
            recipients.push(assignee.email);
        }
        let refs: Vec<&str> = recipients.iter().map(String::as_str).collect();
        Ok(dedup_recipients(&refs))
    }

    /// Best-effort: a full channel or missing dispatcher never fails the
    /// operation.
    async fn send_event(&self, event: Event) {
        if let Some(sender) = &self.event_sender {
            if let Err(e) = sender.send(event).await {
                warn!(error = %e, "Failed to queue notification event");
            }
        }
    }

    fn to_response(
        &self,
        event: stocking_event::Model,
        batches: Vec<fish_batch::Model>,
        settings: &StockingSettings,
        now: DateTime<Utc>,
    ) -> Result<StockingEventResponse, ServiceError> {
        let status = self.derive_or_err(&event, &batches, settings, now)?;
        Ok(StockingEventResponse {
            id: event.id,
            status,
            event_time: event.event_time,
            review_time: event.review_time,
            canceled_at: event.canceled_at,
            fish_origin: event.fish_origin,
            fish_origin_company_name: event.fish_origin_company_name,
            fish_origin_reservoir: event.fish_origin_reservoir,
            tenant_id: event.tenant_id,
            stocking_customer_id: event.stocking_customer_id,
            created_by: event.created_by,
            assigned_to: event.assigned_to,
            reviewed_by: event.reviewed_by,
            assigned_inspector_id: event.assigned_inspector_id,
            inspector: event.inspector,
            reservoir_cadastral_id: event.reservoir_cadastral_id,
            reservoir_name: event.reservoir_name,
            municipality: event.municipality,
            reservoir_area: event.reservoir_area,
            reservoir_length: event.reservoir_length,
            reservoir_category: event.reservoir_category,
            geom_x: event.geom_x,
            geom_y: event.geom_y,
            signatures: event.signatures,
            waybill_no: event.waybill_no,
            vet_approval_no: event.vet_approval_no,
            vet_certificate_no: event.vet_certificate_no,
            water_temp: event.water_temp,
            transport_water_temp: event.transport_water_temp,
            batches,
            created_at: event.created_at,
            updated_at: event.updated_at,
        })
    }
}

async fn load_event<C: ConnectionTrait>(
    conn: &C,
    id: i64,
) -> Result<(stocking_event::Model, Vec<fish_batch::Model>), ServiceError> {
    let event = StockingEventEntity::find_by_id(id)
        .one(conn)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Stocking event {id} not found")))?;
    let batches = FishBatchEntity::find()
        .filter(fish_batch::Column::FishStockingId.eq(id))
        .order_by_asc(fish_batch::Column::Id)
        .all(conn)
        .await?;
    Ok((event, batches))
}

/// Authorization guard, applied before any state check. Tenant events may
/// be modified by members of the owning tenant or the stocking-customer
/// tenant; freelancer events only by their creator or assignee.
pub fn ensure_can_modify(actor: &Actor, event: &stocking_event::Model) -> Result<(), ServiceError> {
    if actor.is_admin() {
        return Ok(());
    }
    let permitted = match event.tenant_id {
        Some(tenant_id) => {
            actor.tenant_id == Some(tenant_id)
                || (event.stocking_customer_id.is_some()
                    && actor.tenant_id == event.stocking_customer_id)
        }
        None => actor.id == event.created_by || actor.id == event.assigned_to,
    };
    if permitted {
        Ok(())
    } else {
        Err(ServiceError::NoRights(
            "not permitted to modify this stocking event".to_string(),
        ))
    }
}

/// Inspectors may view everything; for everyone else viewing follows the
/// modification relationship.
pub fn ensure_can_view(actor: &Actor, event: &stocking_event::Model) -> Result<(), ServiceError> {
    if actor.kind == ActorKind::Inspector {
        return Ok(());
    }
    ensure_can_modify(actor, event)
}

/// Reviewed amounts enter through the review operation, which stamps
/// `review_time`/`reviewed_by` alongside them. Planning paths must not
/// smuggle them in: a pre-filled `review_amount` would make a brand-new
/// event derive as FINISHED.
fn reject_review_data(batches: &[BatchInput]) -> Result<(), ServiceError> {
    if batches
        .iter()
        .any(|b| b.review_amount.is_some() || b.review_weight.is_some())
    {
        return Err(ServiceError::ValidationError(
            "Reviewed amounts can only be submitted through a review".to_string(),
        ));
    }
    Ok(())
}

fn validate_fish_origin(
    origin: &str,
    company_name: Option<&str>,
    reservoir: Option<&str>,
) -> Result<(), ServiceError> {
    match origin {
        FISH_ORIGIN_GROWN => {
            if company_name.map_or(true, str::is_empty) || reservoir.is_some() {
                return Err(ServiceError::InvalidFishOrigin(
                    "grown fish require a company name and no origin reservoir".to_string(),
                ));
            }
        }
        FISH_ORIGIN_CAUGHT => {
            if reservoir.map_or(true, str::is_empty) || company_name.is_some() {
                return Err(ServiceError::InvalidFishOrigin(
                    "caught fish require an origin reservoir and no company name".to_string(),
                ));
            }
        }
        other => {
            return Err(ServiceError::InvalidFishOrigin(format!(
                "unknown fish origin {other:?}"
            )))
        }
    }
    Ok(())
}

fn dedup_recipients(addresses: &[&str]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    addresses
        .iter()
        .filter(|a| !a.is_empty() && seen.insert(a.to_ascii_lowercase()))
        .map(|a| a.to_string())
        .collect()
}
