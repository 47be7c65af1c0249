//! Location Model
//!
//! Shared data types for the location sampling and geofencing core:
//! - Positions and persisted location samples
//! - The monitored geofence region
//! - Geofence transition events as delivered by a geofencing service
//! - The core event bus observed by presentation layers

pub mod events;
pub mod position;
pub mod region;
pub mod transition;

pub use events::{CoreEvent, EventBus};
pub use position::{LocationSample, Position};
pub use region::GeofenceRegion;
pub use transition::{RawGeofenceEvent, TransitionEvent, TransitionKind};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Model validation errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    /// Latitude or longitude outside the valid range, or not finite
    #[error("{field} value {value} is not a valid coordinate")]
    InvalidCoordinate { field: &'static str, value: f64 },

    /// Region radius must be a positive finite number of meters
    #[error("Invalid geofence radius: {0} m")]
    InvalidRadius(f32),

    /// Region identifier must not be empty
    #[error("Geofence region id must not be empty")]
    EmptyRegionId,
}

/// Result of a single location sampler invocation.
///
/// Only the scheduler observes this value; it is never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SampleRunOutcome {
    /// Run completed (a sample was written, or there was no fix to write)
    Success,
    /// Transient failure, the scheduler should run again
    Retry,
    /// Failure that another attempt cannot fix on its own
    PermanentFailure,
}

impl SampleRunOutcome {
    /// Short lowercase label for logs
    pub fn as_str(&self) -> &'static str {
        match self {
            SampleRunOutcome::Success => "success",
            SampleRunOutcome::Retry => "retry",
            SampleRunOutcome::PermanentFailure => "permanent_failure",
        }
    }
}

impl std::fmt::Display for SampleRunOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
