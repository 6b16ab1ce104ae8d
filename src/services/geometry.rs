use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::errors::ServiceError;

/// User-submitted coordinate pair as it arrives in a request.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Validate)]
pub struct Coordinates {
    pub x: f64,
    pub y: f64,
}

/// Stored geometry point of a stocking event.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// Coordinate conversion collaborator, invoked before persistence on
/// register/update. The projection details are opaque to the lifecycle
/// engine.
pub trait GeometryConverter: Send + Sync {
    fn to_point(&self, coordinates: Coordinates) -> Result<Point, ServiceError>;
}

/// Stores coordinates as submitted; stands in for the real projection
/// service, which is an external collaborator.
pub struct PassthroughGeometry;

impl GeometryConverter for PassthroughGeometry {
    fn to_point(&self, coordinates: Coordinates) -> Result<Point, ServiceError> {
        if !coordinates.x.is_finite() || !coordinates.y.is_finite() {
            return Err(ServiceError::ValidationError(
                "Coordinates must be finite numbers".to_string(),
            ));
        }
        Ok(Point {
            x: coordinates.x,
            y: coordinates.y,
        })
    }
}
