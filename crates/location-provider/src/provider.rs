//! Location provider trait

use crate::ProviderError;
use async_trait::async_trait;
use location_model::{GeofenceRegion, Position, RawGeofenceEvent};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::mpsc;

/// Stream of continuous position updates
pub type PositionStream = mpsc::Receiver<Position>;

/// Stream of raw geofence events for one subscription
pub type RegionEventStream = mpsc::Receiver<RawGeofenceEvent>;

/// Accuracy/power trade-off requested from the provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Priority {
    #[default]
    HighAccuracy,
    Balanced,
    LowPower,
}

/// Parameters for continuous location updates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationRequest {
    pub priority: Priority,
    /// Desired interval between updates
    pub interval: Duration,
    /// Updates are never delivered faster than this
    pub fastest_interval: Duration,
}

impl Default for LocationRequest {
    fn default() -> Self {
        Self {
            priority: Priority::HighAccuracy,
            interval: Duration::from_millis(10_000),
            fastest_interval: Duration::from_millis(5_000),
        }
    }
}

/// Source of device positions and geofence transitions.
///
/// Every subscription call returns a fresh stream; a closed stream cannot be
/// restarted, subscribe again instead.
#[async_trait]
pub trait LocationProvider: Send + Sync {
    /// Most recently known device position, `None` if the provider has no fix
    async fn last_known_position(&self) -> Result<Option<Position>, ProviderError>;

    /// Start continuous position updates
    async fn request_location_updates(
        &self,
        request: LocationRequest,
    ) -> Result<PositionStream, ProviderError>;

    /// Register a region and receive its transition events
    async fn subscribe_to_region_events(
        &self,
        region: &GeofenceRegion,
    ) -> Result<RegionEventStream, ProviderError>;
}
