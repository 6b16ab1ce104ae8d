use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;

use crate::{
    auth::AuthActor,
    errors::ServiceError,
    services::stocking_events::{
        AdminUpdateStockingRequest, CancelOutcome, RegisterStockingRequest, ReviewStockingRequest,
        UpdateStockingRequest,
    },
    ApiResponse, AppState,
};

#[derive(Debug, Deserialize)]
pub struct ListParams {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_per_page")]
    pub per_page: u64,
}

fn default_page() -> u64 {
    1
}

fn default_per_page() -> u64 {
    20
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(register).get(list))
        .route("/:id", get(get_one).put(update_registration).delete(delete_one))
        .route("/:id/review", post(review))
        .route("/:id/cancel", post(cancel))
        .route("/:id/admin", put(admin_update))
}

async fn register(
    State(state): State<AppState>,
    AuthActor(actor): AuthActor,
    Json(request): Json<RegisterStockingRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let response = state
        .services
        .stocking_events
        .register(&actor, request)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(response))))
}

async fn get_one(
    State(state): State<AppState>,
    AuthActor(actor): AuthActor,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ServiceError> {
    let response = state.services.stocking_events.get(&actor, id).await?;
    Ok(Json(ApiResponse::success(response)))
}

async fn list(
    State(state): State<AppState>,
    AuthActor(actor): AuthActor,
    Query(params): Query<ListParams>,
) -> Result<impl IntoResponse, ServiceError> {
    let response = state
        .services
        .stocking_events
        .list(&actor, params.page, params.per_page)
        .await?;
    Ok(Json(ApiResponse::success(response)))
}

async fn update_registration(
    State(state): State<AppState>,
    AuthActor(actor): AuthActor,
    Path(id): Path<i64>,
    Json(request): Json<UpdateStockingRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let response = state
        .services
        .stocking_events
        .update_registration(&actor, id, request)
        .await?;
    Ok(Json(ApiResponse::success(response)))
}

async fn review(
    State(state): State<AppState>,
    AuthActor(actor): AuthActor,
    Path(id): Path<i64>,
    Json(request): Json<ReviewStockingRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let response = state
        .services
        .stocking_events
        .review(&actor, id, request)
        .await?;
    Ok(Json(ApiResponse::success(response)))
}

async fn cancel(
    State(state): State<AppState>,
    AuthActor(actor): AuthActor,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ServiceError> {
    match state.services.stocking_events.cancel(&actor, id).await? {
        CancelOutcome::Canceled(response) => {
            Ok(Json(ApiResponse::success(response)).into_response())
        }
        CancelOutcome::Deleted => Ok(StatusCode::NO_CONTENT.into_response()),
    }
}

async fn delete_one(
    State(state): State<AppState>,
    AuthActor(actor): AuthActor,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ServiceError> {
    state.services.stocking_events.delete(&actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn admin_update(
    State(state): State<AppState>,
    AuthActor(actor): AuthActor,
    Path(id): Path<i64>,
    Json(request): Json<AdminUpdateStockingRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let response = state
        .services
        .stocking_events
        .admin_update(&actor, id, request)
        .await?;
    Ok(Json(ApiResponse::success(response)))
}
