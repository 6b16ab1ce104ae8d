use axum::{extract::State, response::IntoResponse, routing::get, Json, Router};
use serde::{Deserialize, Serialize};

use crate::{auth::AuthActor, errors::ServiceError, ApiResponse, AppState};

#[derive(Debug, Serialize, Deserialize)]
pub struct SettingsPayload {
    pub min_time_till_stocking: i32,
    pub max_time_for_registration: i32,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(get_settings).put(update_settings))
}

async fn get_settings(
    State(state): State<AppState>,
    AuthActor(_actor): AuthActor,
) -> Result<impl IntoResponse, ServiceError> {
    let settings = state.services.settings.get().await?;
    Ok(Json(ApiResponse::success(SettingsPayload {
        min_time_till_stocking: settings.min_time_till_stocking,
        max_time_for_registration: settings.max_time_for_registration,
    })))
}

async fn update_settings(
    State(state): State<AppState>,
    AuthActor(actor): AuthActor,
    Json(payload): Json<SettingsPayload>,
) -> Result<impl IntoResponse, ServiceError> {
    actor.require_admin()?;
    let settings = state
        .services
        .settings
        .update(
            payload.min_time_till_stocking,
            payload.max_time_for_registration,
        )
        .await?;
    Ok(Json(ApiResponse::success(SettingsPayload {
        min_time_till_stocking: settings.min_time_till_stocking,
        max_time_for_registration: settings.max_time_for_registration,
    })))
}
