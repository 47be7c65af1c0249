//! Geofence region definition

use crate::{ModelError, Position};
use serde::{Deserialize, Serialize};

/// A circular region monitored by the geofencing service.
///
/// Created once at startup and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeofenceRegion {
    /// Unique region identifier
    pub id: String,
    /// Center of the circle
    pub center: Position,
    /// Radius in meters
    pub radius_m: f32,
}

impl GeofenceRegion {
    /// Create a validated region
    pub fn new(id: impl Into<String>, center: Position, radius_m: f32) -> Result<Self, ModelError> {
        let id = id.into();
        if id.is_empty() {
            return Err(ModelError::EmptyRegionId);
        }
        if !radius_m.is_finite() || radius_m <= 0.0 {
            return Err(ModelError::InvalidRadius(radius_m));
        }
        Ok(Self {
            id,
            center,
            radius_m,
        })
    }
}
