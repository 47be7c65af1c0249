//! Geofence Handling
//!
//! Turns geofence transition events into user-facing notices and core
//! events. Each event is judged on its own; no transition history is kept.

mod handler;
mod monitor;
mod notice;

pub use handler::{GeofenceHandler, HandlerConfig};
pub use monitor::{register_region, GeofenceMonitor};
pub use notice::{LogNotifier, Notice, NoticeDuration, NoticeKind, Notifier, RecordingNotifier};

use thiserror::Error;

/// Geofence registration errors
#[derive(Debug, Error)]
pub enum GeofenceError {
    #[error("Failed to register region {region_id}: {source}")]
    Registration {
        region_id: String,
        #[source]
        source: location_provider::ProviderError,
    },
}
