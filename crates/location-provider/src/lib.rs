//! Location Provider Ports
//!
//! Abstractions over the platform location and geofencing services the core
//! depends on, plus implementations that run without a platform:
//! - [`SimulatedProvider`] walks a fixed route and evaluates regions itself
//! - [`ScriptedProvider`] replays canned answers for tests

mod clock;
mod error;
mod permission;
mod provider;
mod scripted;
mod simulated;

pub use clock::{Clock, FixedClock, SystemClock};
pub use error::ProviderError;
pub use permission::{PermissionSource, PermissionStatus, StaticPermission};
pub use provider::{LocationProvider, LocationRequest, PositionStream, Priority, RegionEventStream};
pub use scripted::ScriptedProvider;
pub use simulated::{haversine_distance_m, SimulatedProvider};
