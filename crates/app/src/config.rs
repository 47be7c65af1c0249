//! Application configuration
//!
//! Layered: built-in defaults, then an optional TOML file, then
//! `GEOTRACK_<SECTION>__<KEY>` environment variables.

use anyhow::Context;
use geofence::HandlerConfig;
use location_model::{GeofenceRegion, ModelError, Position};
use location_provider::{LocationRequest, Priority};
use location_sampler::SamplerConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Config file looked up in the working directory when none is given
pub const DEFAULT_CONFIG_FILE: &str = "geotrack.toml";

/// Environment variable prefix
pub const ENV_PREFIX: &str = "GEOTRACK";

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub sampler: SamplerSection,
    pub storage: StorageSection,
    pub geofence: GeofenceSection,
    pub tracker: TrackerSection,
    pub logging: LoggingSection,
    pub simulation: SimulationSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplerSection {
    pub period_secs: u64,
    pub work_name: String,
    pub retry_backoff_secs: u64,
    pub max_backoff_secs: u64,
}

impl Default for SamplerSection {
    fn default() -> Self {
        let defaults = SamplerConfig::default();
        Self {
            period_secs: defaults.period.as_secs(),
            work_name: defaults.work_name,
            retry_backoff_secs: defaults.retry_backoff.as_secs(),
            max_backoff_secs: defaults.max_backoff.as_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSection {
    /// Private data directory of the application
    pub data_dir: PathBuf,
    pub file_name: String,
}

impl Default for StorageSection {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            file_name: sample_store::DEFAULT_FILE_NAME.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeofenceSection {
    pub id: String,
    pub latitude: f64,
    pub longitude: f64,
    pub radius_m: f32,
    pub place_name: String,
}

impl Default for GeofenceSection {
    fn default() -> Self {
        Self {
            id: "ExampleGeofence".to_string(),
            latitude: 43.6532,
            longitude: -79.3832,
            radius_m: 200.0,
            place_name: HandlerConfig::default().place_name,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerSection {
    pub priority: Priority,
    pub interval_ms: u64,
    pub fastest_interval_ms: u64,
}

impl Default for TrackerSection {
    fn default() -> Self {
        let defaults = LocationRequest::default();
        Self {
            priority: defaults.priority,
            interval_ms: defaults.interval.as_millis() as u64,
            fastest_interval_ms: defaults.fastest_interval.as_millis() as u64,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// One of trace, debug, info, warn, error
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationSection {
    /// Time between simulated position changes
    pub step_ms: u64,
    /// Waypoints per pass across the geofence
    pub route_steps: usize,
    /// Whether the host reports the location permission as granted
    pub permission_granted: bool,
}

impl Default for SimulationSection {
    fn default() -> Self {
        Self {
            step_ms: 3_000,
            route_steps: 20,
            permission_granted: true,
        }
    }
}

impl AppConfig {
    /// Load configuration from `path` (required) or [`DEFAULT_CONFIG_FILE`] (optional)
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let file = match path {
            Some(path) => config::File::from(path).required(true),
            None => config::File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        let settings = config::Config::builder()
            .add_source(file)
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("failed to read configuration")?;

        let config: Self = settings
            .try_deserialize()
            .context("invalid configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Reject timings the scheduler cannot run with
    pub fn validate(&self) -> anyhow::Result<()> {
        let sampler = &self.sampler;
        anyhow::ensure!(sampler.period_secs > 0, "sampler.period_secs must be positive");
        anyhow::ensure!(
            sampler.retry_backoff_secs > 0,
            "sampler.retry_backoff_secs must be positive"
        );
        anyhow::ensure!(
            sampler.max_backoff_secs >= sampler.retry_backoff_secs,
            "sampler.max_backoff_secs ({}) is below retry_backoff_secs ({})",
            sampler.max_backoff_secs,
            sampler.retry_backoff_secs
        );
        Ok(())
    }

    pub fn sampler_config(&self) -> SamplerConfig {
        SamplerConfig {
            period: Duration::from_secs(self.sampler.period_secs),
            work_name: self.sampler.work_name.clone(),
            retry_backoff: Duration::from_secs(self.sampler.retry_backoff_secs),
            max_backoff: Duration::from_secs(self.sampler.max_backoff_secs),
        }
    }

    pub fn region(&self) -> Result<GeofenceRegion, ModelError> {
        let center = Position::new(self.geofence.latitude, self.geofence.longitude)?;
        GeofenceRegion::new(self.geofence.id.clone(), center, self.geofence.radius_m)
    }

    pub fn handler_config(&self) -> HandlerConfig {
        HandlerConfig {
            place_name: self.geofence.place_name.clone(),
        }
    }

    pub fn location_request(&self) -> LocationRequest {
        LocationRequest {
            priority: self.tracker.priority,
            interval: Duration::from_millis(self.tracker.interval_ms),
            fastest_interval: Duration::from_millis(self.tracker.fastest_interval_ms),
        }
    }
}
