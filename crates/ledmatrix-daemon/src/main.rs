//! LED Matrix Daemon
//!
//! Claims every connected LED matrix module, applies its configuration and
//! drives the configured preset until interrupted.

mod config;
mod presets;
mod scheduler;

use anyhow::{bail, Context, Result};
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use config::Config;
use ledmatrix_hw::{LedMatrix, UsbManager};
use scheduler::SharedMatrix;

#[tokio::main]
async fn main() -> Result<()> {
    // Setup logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config/default.toml".to_string());

    let config = Config::load_or_default(&config_path).context("Failed to load configuration")?;
    info!("Loaded configuration from: {}", config_path);

    let mut manager = UsbManager::new().context("Failed to initialize USB")?;
    let matrices = manager.enumerate();
    if matrices.is_empty() {
        bail!("No devices found");
    }
    info!("Found {} LED matrix device(s)", matrices.len());

    let registry = presets::registry();
    let devices: Vec<SharedMatrix> = matrices
        .into_iter()
        .map(|mut matrix| {
            let device_config = config.config_for(matrix.id());
            if let Err(e) = matrix.apply_config(&device_config, &registry) {
                warn!("Device {} left without a preset: {}", matrix.id(), e);
            }
            Arc::new(Mutex::new(matrix))
        })
        .collect();

    // Start one render loop per device
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let tasks: Vec<_> = devices
        .iter()
        .map(|device| tokio::spawn(scheduler::render_loop(device.clone(), shutdown_rx.clone())))
        .collect();

    // Setup Unix signal handlers
    let mut sigterm = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())?;
    let mut sigint = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::interrupt())?;

    tokio::select! {
        _ = sigterm.recv() => {
            info!("Received SIGTERM, shutting down");
        }
        _ = sigint.recv() => {
            info!("Received SIGINT, shutting down");
        }
    }

    let _ = shutdown_tx.send(true);
    for task in tasks {
        if let Err(e) = task.await {
            warn!("Render task failed: {}", e);
        }
    }

    let matrices: Vec<LedMatrix> = devices
        .into_iter()
        .filter_map(|device| match Arc::try_unwrap(device) {
            Ok(mutex) => Some(mutex.into_inner().unwrap_or_else(|e| e.into_inner())),
            Err(_) => {
                warn!("Device still in use at shutdown, closing on drop");
                None
            }
        })
        .collect();
    ledmatrix_hw::teardown_all(matrices);

    info!("All devices released");
    Ok(())
}
