use axum::{extract::State, response::IntoResponse, routing::get, Json, Router};

use crate::{errors::ServiceError, ApiResponse, AppState};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/fish-types", get(list_fish_types))
        .route("/fish-ages", get(list_fish_ages))
}

async fn list_fish_types(State(state): State<AppState>) -> Result<impl IntoResponse, ServiceError> {
    let types = state.services.reference_data.list_fish_types().await?;
    Ok(Json(ApiResponse::success(types)))
}

async fn list_fish_ages(State(state): State<AppState>) -> Result<impl IntoResponse, ServiceError> {
    let ages = state.services.reference_data.list_fish_ages().await?;
    Ok(Json(ApiResponse::success(ages)))
}
