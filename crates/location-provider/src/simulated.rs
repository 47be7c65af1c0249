//! Simulated location and geofencing service
//!
//! Walks a fixed route one waypoint per step. Each step updates the last
//! known position, feeds update subscribers, and checks registered regions
//! for boundary crossings.

use crate::{LocationProvider, LocationRequest, PositionStream, ProviderError, RegionEventStream};
use async_trait::async_trait;
use location_model::{GeofenceRegion, Position, RawGeofenceEvent, TransitionKind};
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Mean Earth radius in meters
const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// Meters per degree of latitude
const METERS_PER_DEGREE: f64 = 111_320.0;

/// Channel depth for simulated subscriptions
const STREAM_CAPACITY: usize = 32;

/// Great-circle distance between two positions in meters
pub fn haversine_distance_m(a: Position, b: Position) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let dlat = (b.latitude - a.latitude).to_radians();
    let dlng = (b.longitude - a.longitude).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlng / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * h.sqrt().asin()
}

/// Region side as last observed by the simulator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RegionSide {
    Unknown,
    Inside,
    Outside,
}

struct RegionWatch {
    region: GeofenceRegion,
    side: RegionSide,
    tx: mpsc::Sender<RawGeofenceEvent>,
}

struct SimState {
    route: Vec<Position>,
    next_index: usize,
    last_known: Option<Position>,
    enabled: bool,
    update_senders: Vec<mpsc::Sender<Position>>,
    watches: Vec<RegionWatch>,
}

/// Provider backed by a simulated walk along waypoints
pub struct SimulatedProvider {
    state: Mutex<SimState>,
}

impl SimulatedProvider {
    /// Create a simulator walking `route` in a loop
    pub fn new(route: Vec<Position>) -> Self {
        info!("Creating simulated provider with {} waypoints", route.len());
        Self {
            state: Mutex::new(SimState {
                route,
                next_index: 0,
                last_known: None,
                enabled: true,
                update_senders: Vec::new(),
                watches: Vec::new(),
            }),
        }
    }

    /// Straight east-west route crossing `region` through its center.
    ///
    /// Starts and ends two radii away from the center so every pass produces
    /// one ENTER and one EXIT.
    pub fn crossing_route(region: &GeofenceRegion, steps: usize) -> Vec<Position> {
        let steps = steps.max(2);
        let center = region.center;
        let half_span_m = 2.0 * f64::from(region.radius_m);
        let meters_per_lng_degree = METERS_PER_DEGREE * center.latitude.to_radians().cos().max(1e-6);

        (0..steps)
            .map(|i| {
                let t = i as f64 / (steps - 1) as f64;
                let offset_m = -half_span_m + 2.0 * half_span_m * t;
                Position {
                    latitude: center.latitude,
                    longitude: center.longitude + offset_m / meters_per_lng_degree,
                }
            })
            .collect()
    }

    /// Simulate the user switching location services on or off
    pub fn set_enabled(&self, enabled: bool) {
        if let Ok(mut state) = self.state.lock() {
            info!("Simulated location services {}", if enabled { "enabled" } else { "disabled" });
            state.enabled = enabled;
        }
    }

    /// Advance one waypoint and deliver the resulting events.
    ///
    /// Returns the new position, or `None` if the route is empty or the
    /// simulated services are disabled.
    pub fn step(&self) -> Option<Position> {
        let mut state = match self.state.lock() {
            Ok(state) => state,
            Err(e) => {
                warn!("Simulator state unavailable: {}", e);
                return None;
            }
        };

        if !state.enabled || state.route.is_empty() {
            return None;
        }

        let index = state.next_index % state.route.len();
        let position = state.route[index];
        state.next_index = index + 1;
        state.last_known = Some(position);
        debug!("Simulated position {}", position);

        state.update_senders.retain(|tx| !tx.is_closed());
        for tx in &state.update_senders {
            if tx.try_send(position).is_err() {
                warn!("Dropping simulated location update, subscriber is lagging");
            }
        }

        state.watches.retain(|watch| !watch.tx.is_closed());
        for watch in state.watches.iter_mut() {
            let distance = haversine_distance_m(watch.region.center, position);
            let inside = distance <= f64::from(watch.region.radius_m);

            let transition = match (watch.side, inside) {
                (RegionSide::Unknown | RegionSide::Outside, true) => Some(TransitionKind::Enter),
                (RegionSide::Inside, false) => Some(TransitionKind::Exit),
                _ => None,
            };
            watch.side = if inside { RegionSide::Inside } else { RegionSide::Outside };

            if let Some(kind) = transition {
                debug!("Region {} {:?} at {:.1} m", watch.region.id, kind, distance);
                let event = RawGeofenceEvent::transition(watch.region.id.clone(), kind);
                if watch.tx.try_send(event).is_err() {
                    warn!("Dropping geofence event for {}", watch.region.id);
                }
            }
        }

        Some(position)
    }

    /// Step forever at `period`
    pub async fn run(&self, period: Duration) {
        let mut ticker = tokio::time::interval(period);
        loop {
            ticker.tick().await;
            self.step();
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, SimState>, ProviderError> {
        self.state
            .lock()
            .map_err(|e| ProviderError::Transient(format!("Lock error: {}", e)))
    }
}

#[async_trait]
impl LocationProvider for SimulatedProvider {
    async fn last_known_position(&self) -> Result<Option<Position>, ProviderError> {
        let state = self.lock()?;
        if !state.enabled {
            return Err(ProviderError::LocationDisabled);
        }
        Ok(state.last_known)
    }

    async fn request_location_updates(
        &self,
        request: LocationRequest,
    ) -> Result<PositionStream, ProviderError> {
        let mut state = self.lock()?;
        if !state.enabled {
            return Err(ProviderError::LocationDisabled);
        }
        debug!("Simulated location updates requested: {:?}", request);
        let (tx, rx) = mpsc::channel(STREAM_CAPACITY);
        state.update_senders.push(tx);
        Ok(rx)
    }

    async fn subscribe_to_region_events(
        &self,
        region: &GeofenceRegion,
    ) -> Result<RegionEventStream, ProviderError> {
        let mut state = self.lock()?;
        let (tx, rx) = mpsc::channel(STREAM_CAPACITY);
        info!(
            "Registered geofence {} at {} (radius {} m)",
            region.id, region.center, region.radius_m
        );
        state.watches.push(RegionWatch {
            region: region.clone(),
            side: RegionSide::Unknown,
            tx,
        });
        Ok(rx)
    }
}
