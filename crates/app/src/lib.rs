//! Geotrack Service
//!
//! Wires the location core together: a simulated location service, the
//! recurring location sampler, the geofence monitor, and the live tracker.
//! A log-based observer stands in for the map screen.

pub mod config;
mod logging;

pub use config::AppConfig;
pub use logging::init_logging;

use anyhow::Context;
use geofence::{register_region, GeofenceHandler, GeofenceMonitor, LogNotifier, Notifier};
use location_model::{CoreEvent, EventBus, GeofenceRegion};
use location_provider::{SimulatedProvider, StaticPermission, SystemClock};
use location_sampler::{
    ExistingWorkPolicy, LocationSampler, LocationTracker, TokioWorkScheduler, WorkScheduler,
};
use sample_store::SampleStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Running service and the background tasks it owns
pub struct Service {
    config: AppConfig,
    region: GeofenceRegion,
    provider: Arc<SimulatedProvider>,
    permission: Arc<StaticPermission>,
    notifier: Arc<dyn Notifier>,
    bus: EventBus,
    scheduler: TokioWorkScheduler,
    tasks: Vec<JoinHandle<()>>,
}

impl Service {
    /// Build the service from configuration
    pub fn new(config: AppConfig, notifier: Arc<dyn Notifier>) -> anyhow::Result<Self> {
        let region = config.region().context("invalid geofence configuration")?;
        let route = SimulatedProvider::crossing_route(&region, config.simulation.route_steps);
        let permission = if config.simulation.permission_granted {
            StaticPermission::granted()
        } else {
            StaticPermission::denied()
        };
        let scheduler = TokioWorkScheduler::new(config.sampler_config().backoff());

        Ok(Self {
            region,
            provider: Arc::new(SimulatedProvider::new(route)),
            permission: Arc::new(permission),
            notifier,
            bus: EventBus::default(),
            scheduler,
            tasks: Vec::new(),
            config,
        })
    }

    /// Simulated location service backing this instance
    pub fn provider(&self) -> &Arc<SimulatedProvider> {
        &self.provider
    }

    /// Host permission flag
    pub fn permission(&self) -> &Arc<StaticPermission> {
        &self.permission
    }

    /// Bus the core publishes on
    pub fn event_bus(&self) -> &EventBus {
        &self.bus
    }

    /// Store the sampler writes to
    pub fn sample_store(&self) -> SampleStore {
        SampleStore::new(
            self.config.storage.data_dir.clone(),
            &self.config.storage.file_name,
        )
    }

    /// Register the geofence, start tracking, and schedule the sampler
    pub async fn start(&mut self) -> anyhow::Result<()> {
        let events = register_region(self.provider.as_ref(), &self.region).await?;
        let handler = GeofenceHandler::new(self.config.handler_config(), self.notifier.clone())
            .with_event_bus(self.bus.clone());
        let monitor = GeofenceMonitor::new(handler);
        self.tasks.push(tokio::spawn(async move {
            monitor.run(events).await;
        }));

        let tracker = LocationTracker::new(
            self.provider.clone(),
            self.bus.clone(),
            self.config.location_request(),
        );
        self.tasks.push(tokio::spawn(async move {
            if let Err(e) = tracker.run().await {
                warn!("Location tracking unavailable: {}", e);
            }
        }));

        let sampler_config = self.config.sampler_config();
        let sampler = Arc::new(LocationSampler::new(
            self.provider.clone(),
            self.permission.clone(),
            Arc::new(SystemClock),
            self.sample_store(),
        ));
        self.scheduler
            .schedule_recurring(
                &sampler_config.work_name,
                sampler_config.period,
                ExistingWorkPolicy::Replace,
                sampler,
            )
            .context("failed to schedule location sampler")?;

        info!("Service started");
        Ok(())
    }

    /// Drive the simulated location service at the configured step
    pub fn spawn_simulation(&mut self) {
        let provider = self.provider.clone();
        let step = Duration::from_millis(self.config.simulation.step_ms);
        self.tasks.push(tokio::spawn(async move {
            provider.run(step).await;
        }));
    }

    /// Log core events the way the map screen would consume them
    pub fn spawn_observer(&mut self) {
        let events = self.bus.subscribe();
        self.tasks.push(tokio::spawn(observe(events)));
    }

    /// Cancel scheduled work and background tasks
    pub fn shutdown(&mut self) {
        self.scheduler.shutdown();
        for task in self.tasks.drain(..) {
            task.abort();
        }
        info!("Service stopped");
    }
}

async fn observe(mut events: broadcast::Receiver<CoreEvent>) {
    loop {
        match events.recv().await {
            Ok(CoreEvent::LocationUpdated(position)) => {
                info!(target: "map", "Marker moved to {}", position);
            }
            Ok(CoreEvent::TransitionOccurred { region_id, kind }) => {
                info!(target: "map", "Region {} transition {:?}", region_id, kind);
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!(target: "map", "Observer skipped {} events", skipped);
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

/// Run the service until Ctrl-C
pub async fn run(config: AppConfig) -> anyhow::Result<()> {
    let mut service = Service::new(config, Arc::new(LogNotifier))?;
    service.spawn_observer();
    service.start().await?;
    service.spawn_simulation();

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;
    info!("Shutdown requested");
    service.shutdown();
    Ok(())
}
