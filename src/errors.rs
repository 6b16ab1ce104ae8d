use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use sea_orm::error::DbErr;
use serde::{Deserialize, Serialize};

/// JSON body returned for every error response.
///
/// `code` is the stable machine-readable contract (`INVALID_STATUS`,
/// `INVALID_EVENT_TIME`, `NO_RIGHTS`, ...); clients branch on it instead of
/// parsing `message`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// HTTP status category (e.g. "Bad Request", "Forbidden")
    pub error: String,
    /// Stable machine-readable error code
    pub code: String,
    /// Human-readable error description
    pub message: String,
    /// ISO 8601 timestamp when the error occurred
    pub timestamp: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sea_orm::error::DbErr),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid status: {0}")]
    InvalidStatus(String),

    #[error("Invalid event time: {0}")]
    InvalidEventTime(String),

    #[error("Unknown fish type: {0}")]
    InvalidFishType(i64),

    #[error("Unknown fish age: {0}")]
    InvalidFishAge(i64),

    #[error("Invalid assignee: {0}")]
    InvalidAssignedTo(i64),

    #[error("Invalid stocking customer: {0}")]
    InvalidStockingCustomer(i64),

    #[error("Invalid fish origin: {0}")]
    InvalidFishOrigin(String),

    #[error("Deletion attempted after the permitted deletion time")]
    AfterPermittedDeletionTime,

    #[error("No rights: {0}")]
    NoRights(String),

    #[error("Internal error: {0}")]
    InternalError(String),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(err: validator::ValidationErrors) -> Self {
        ServiceError::ValidationError(err.to_string())
    }
}

pub trait IntoDbErr {
    fn into_db_err(self) -> DbErr;
}

impl IntoDbErr for DbErr {
    fn into_db_err(self) -> DbErr {
        self
    }
}

impl IntoDbErr for String {
    fn into_db_err(self) -> DbErr {
        DbErr::Custom(self)
    }
}

impl IntoDbErr for &str {
    fn into_db_err(self) -> DbErr {
        DbErr::Custom(self.to_string())
    }
}

impl ServiceError {
    /// Generic constructor that normalizes any supported database error input.
    pub fn db_error<E: IntoDbErr>(error: E) -> Self {
        ServiceError::DatabaseError(error.into_db_err())
    }

    /// Stable machine-readable code surfaced to API consumers.
    pub fn code(&self) -> &'static str {
        match self {
            Self::DatabaseError(_) => "DATABASE_ERROR",
            Self::NotFound(_) => "NOT_FOUND",
            Self::ValidationError(_) => "VALIDATION_ERROR",
            Self::InvalidStatus(_) => "INVALID_STATUS",
            Self::InvalidEventTime(_) => "INVALID_EVENT_TIME",
            Self::InvalidFishType(_) => "INVALID_FISH_TYPE",
            Self::InvalidFishAge(_) => "INVALID_FISH_AGE",
            Self::InvalidAssignedTo(_) => "INVALID_ASSIGNED_TO",
            Self::InvalidStockingCustomer(_) => "INVALID_STOCKING_CUSTOMER",
            Self::InvalidFishOrigin(_) => "INVALID_FISH_ORIGIN",
            Self::AfterPermittedDeletionTime => "AFTER_PERMITTED_DELETION_TIME",
            Self::NoRights(_) => "NO_RIGHTS",
            Self::InternalError(_) | Self::Other(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns the HTTP status code for this error.
    /// This is the single source of truth for error-to-status mapping.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::DatabaseError(_) | Self::InternalError(_) | Self::Other(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::ValidationError(_)
            | Self::InvalidStatus(_)
            | Self::InvalidEventTime(_)
            | Self::InvalidFishType(_)
            | Self::InvalidFishAge(_)
            | Self::InvalidAssignedTo(_)
            | Self::InvalidStockingCustomer(_)
            | Self::InvalidFishOrigin(_)
            | Self::AfterPermittedDeletionTime => StatusCode::BAD_REQUEST,
            Self::NoRights(_) => StatusCode::FORBIDDEN,
        }
    }

    /// Returns the error message suitable for HTTP responses.
    /// Internal errors return generic messages to avoid leaking implementation details.
    pub fn response_message(&self) -> String {
        match self {
            Self::DatabaseError(_) => "Database error".to_string(),
            Self::InternalError(_) | Self::Other(_) => "Internal server error".to_string(),
            _ => self.to_string(),
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let err = ErrorResponse {
            error: status.canonical_reason().unwrap_or("Error").to_string(),
            code: self.code().to_string(),
            message: self.response_message(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        };

        (status, Json(err)).into_response()
    }
}
