//! Positions and persisted samples

use crate::ModelError;
use serde::{Deserialize, Serialize};

/// A geographic position in decimal degrees (WGS84)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Latitude in degrees, [-90, 90]
    pub latitude: f64,
    /// Longitude in degrees, [-180, 180]
    pub longitude: f64,
}

impl Position {
    /// Create a validated position
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, ModelError> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(ModelError::InvalidCoordinate {
                field: "latitude",
                value: latitude,
            });
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(ModelError::InvalidCoordinate {
                field: "longitude",
                value: longitude,
            });
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}, {}", self.latitude, self.longitude)
    }
}

/// A position captured at a point in time.
///
/// Serializes as `{"latitude":..,"longitude":..,"timestamp":..}`, which is the
/// on-disk format of the persisted sample file.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocationSample {
    pub latitude: f64,
    pub longitude: f64,
    /// Wall-clock capture time, milliseconds since the Unix epoch
    #[serde(rename = "timestamp")]
    pub captured_at_ms: i64,
}

impl LocationSample {
    /// Create a sample from a position and capture time
    pub fn new(position: Position, captured_at_ms: i64) -> Self {
        Self {
            latitude: position.latitude,
            longitude: position.longitude,
            captured_at_ms,
        }
    }

    /// The sampled position
    pub fn position(&self) -> Position {
        Position {
            latitude: self.latitude,
            longitude: self.longitude,
        }
    }
}
