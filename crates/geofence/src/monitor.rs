//! Region registration and event pumping

use crate::{GeofenceError, GeofenceHandler};
use location_model::GeofenceRegion;
use location_provider::{LocationProvider, RegionEventStream};
use tracing::info;

/// Register `region` with the provider's geofencing service
pub async fn register_region(
    provider: &dyn LocationProvider,
    region: &GeofenceRegion,
) -> Result<RegionEventStream, GeofenceError> {
    let stream = provider
        .subscribe_to_region_events(region)
        .await
        .map_err(|source| GeofenceError::Registration {
            region_id: region.id.clone(),
            source,
        })?;
    info!(
        "Geofence {} registered ({} m around {})",
        region.id, region.radius_m, region.center
    );
    Ok(stream)
}

/// Feeds a region event stream into a [`GeofenceHandler`]
pub struct GeofenceMonitor {
    handler: GeofenceHandler,
}

impl GeofenceMonitor {
    pub fn new(handler: GeofenceHandler) -> Self {
        Self { handler }
    }

    /// Handle events until the stream ends; returns how many were handled
    pub async fn run(&self, mut events: RegionEventStream) -> usize {
        let mut handled = 0;
        while let Some(raw) = events.recv().await {
            self.handler.on_event(&raw);
            handled += 1;
        }
        info!("Geofence event stream closed after {} events", handled);
        handled
    }
}
