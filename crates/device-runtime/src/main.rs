//! Entry point for the route device runtime.

use anyhow::{Context, Result};
use device_runtime::{DeviceRuntime, PidFile, RuntimeConfig};
use device_telemetry::init_telemetry;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    let config = RuntimeConfig::load().context("Failed to load configuration")?;
    let _telemetry = init_telemetry(&config.telemetry).context("Failed to initialize telemetry")?;

    let _pid_file = match &config.pid_file {
        Some(path) => Some(PidFile::acquire(path).context("Failed to acquire PID file")?),
        None => None,
    };

    info!(
        device = %config.device.device_name,
        version = route_device::VERSION,
        "Starting device runtime"
    );

    let runtime = DeviceRuntime::new(config);
    runtime
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "Failed to listen for Ctrl+C, shutting down");
            }
        })
        .await;

    info!("Device runtime stopped");
    Ok(())
}
