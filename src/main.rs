//! NRF service host.
//!
//! # Architecture Overview
//!
//! ```text
//!   nrf [--nrfcfg PATH] [--free5gccfg PATH]          nrf --exec ...
//!            │                                              │
//!            ▼                                              ▼
//!   ┌─────────────────┐                           ┌──────────────────┐
//!   │   initialize    │  config → logging          │   initialize     │
//!   └────────┬────────┘                           └────────┬─────────┘
//!            ▼                                              ▼
//!   ┌─────────────────┐   ┌───────────────┐       ┌──────────────────┐
//!   │      start      │──▶│ signal watcher│       │    supervisor    │
//!   │ wiring, latency │   └───────┬───────┘       │ child + 2 drains │
//!   │ window, bind    │           │ first signal  └──────────────────┘
//!   └────────┬────────┘           ▼
//!            ▼              grace → terminate → exit 0
//!      serve (http/https)
//! ```

use std::error::Error;
use std::sync::Arc;
use std::time::SystemTime;

use clap::Parser;

use nrf::cli::Cli;
use nrf::lifecycle::{connect_store, LifecycleController, SignalWatcher, StartOptions, Supervisor};
use nrf::observability::metrics::init_metrics;
use nrf::telemetry::StartupReference;
use nrf::wiring::NrfWiring;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let started_at = SystemTime::now();
    let cli = Cli::parse();

    let controller = Arc::new(LifecycleController::new(Arc::new(NrfWiring::new())));
    controller.initialize(&cli.config)?;

    if cli.exec {
        let supervisor = Supervisor::relaunch_self(&cli.config)?;
        let report = supervisor.exec().await?;
        tracing::info!(
            status = %report.status,
            stdout_lines = report.stdout_lines,
            stderr_lines = report.stderr_lines,
            "Supervised instance finished"
        );
        return Ok(());
    }

    let Some(config) = controller.config() else {
        return Err("configuration missing after initialize".into());
    };

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let telemetry = &config.configuration.telemetry;
    let mut reference = StartupReference::new(started_at);
    if !telemetry.reference_key.is_empty() {
        reference = reference.with_reference_key(telemetry.reference_key.clone());
    }

    let options = StartOptions {
        reference,
        store: connect_store(telemetry).await,
        watcher: SignalWatcher::os()?,
    };

    if let Err(e) = controller.start(options).await {
        tracing::error!(error = %e, "NRF startup failed");
        return Err(e.into());
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
