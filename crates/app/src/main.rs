//! Geotrack - Main Entry Point

use app::{init_logging, run, AppConfig};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

/// Location sampling and geofence notification service
#[derive(Debug, Parser)]
#[command(name = "geotrack", version, about)]
struct Cli {
    /// Path to a TOML config file (defaults to ./geotrack.toml if present)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref())?;
    init_logging(&config.logging)?;

    info!("=== Geotrack v{} ===", env!("CARGO_PKG_VERSION"));
    info!(
        "Sampling every {}s, geofence {} ({} m)",
        config.sampler.period_secs, config.geofence.id, config.geofence.radius_m
    );

    run(config).await
}
