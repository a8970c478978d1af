#![deny(unsafe_code)]

//! sensorex CLI — hardware sensor metrics exporter.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use sensorex_config::AppConfig;
use sensorex_core::{Daemon, build_info};

/// sensorex — export lm-sensors chip readings and hddtemp disk
/// temperatures as Prometheus metrics.
#[derive(Parser)]
#[command(name = "sensorex", version, about, long_about = None)]
struct Cli {
    /// Path to configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address on which to expose metrics and web interface.
    #[arg(long)]
    listen_address: Option<String>,

    /// Path under which to expose metrics.
    #[arg(long)]
    telemetry_path: Option<String>,

    /// Increase log verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up tracing subscriber with verbosity level
    let filter = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .init();

    let config = match resolve_config(&cli).await {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "invalid configuration");
            return ExitCode::from(2);
        }
    };

    info!(version = %build_info::version_string(), "sensorex starting");

    let daemon = Daemon::new(config);
    match daemon.run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "exporter terminated");
            ExitCode::from(e.exit_code() as u8)
        }
    }
}

async fn resolve_config(cli: &Cli) -> Result<AppConfig> {
    let mut config = match &cli.config {
        Some(path) => load_config(path).await?,
        None => AppConfig::default(),
    };

    if let Some(listen_address) = &cli.listen_address {
        config.server.listen_addr = listen_address.clone();
    }
    if let Some(telemetry_path) = &cli.telemetry_path {
        config.server.telemetry_path = telemetry_path.clone();
    }
    config.validate().map_err(|e| anyhow::anyhow!(e))?;
    Ok(config)
}

async fn load_config(path: &Path) -> Result<AppConfig> {
    if path.exists() {
        AppConfig::load(path).await.map_err(|e| anyhow::anyhow!(e))
    } else {
        info!(path = %path.display(), "Config file not found, using defaults");
        Ok(AppConfig::default())
    }
}
