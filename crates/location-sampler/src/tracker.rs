//! Live location tracking
//!
//! Forwards continuous provider updates to the core event bus so the map
//! layer can move its marker and camera without sharing state with the core.

use location_model::{CoreEvent, EventBus};
use location_provider::{LocationProvider, LocationRequest, ProviderError};
use std::sync::Arc;
use tracing::{debug, info};

/// Publishes every position update as [`CoreEvent::LocationUpdated`]
pub struct LocationTracker {
    provider: Arc<dyn LocationProvider>,
    bus: EventBus,
    request: LocationRequest,
}

impl LocationTracker {
    pub fn new(provider: Arc<dyn LocationProvider>, bus: EventBus, request: LocationRequest) -> Self {
        Self {
            provider,
            bus,
            request,
        }
    }

    /// Subscribe to updates and forward them until the provider ends the stream.
    ///
    /// Returns the number of updates forwarded.
    pub async fn run(&self) -> Result<usize, ProviderError> {
        let mut updates = self.provider.request_location_updates(self.request).await?;
        info!(
            "Tracking location every {:?} ({:?})",
            self.request.interval, self.request.priority
        );

        let mut forwarded = 0;
        while let Some(position) = updates.recv().await {
            debug!("Location update {}", position);
            self.bus.publish(CoreEvent::LocationUpdated(position));
            forwarded += 1;
        }

        info!("Location updates ended after {} positions", forwarded);
        Ok(forwarded)
    }
}
