//! # Device Telemetry
//!
//! Observability plumbing shared by the route device crates.
//!
//! ## Components
//!
//! - **Logs**: `tracing-subscriber` with env filtering, pretty or JSON output
//! - **Traces**: optional OTLP export through OpenTelemetry
//! - **Correlation**: `CorrelationContext`, the explicit key/value map that is
//!   captured where a fault is caught and carried into the state controller
//!
//! ## Usage
//!
//! ```rust,ignore
//! use device_telemetry::{init_telemetry, TelemetryConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = TelemetryConfig::from_env();
//!     let _guard = init_telemetry(&config).expect("Failed to init telemetry");
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `OTEL_SERVICE_NAME` | `route-device` | Service name in traces |
//! | `OTEL_EXPORTER_OTLP_ENDPOINT` | unset | Enables OTLP export when set |
//! | `RD_LOG_LEVEL` | `info` | Log level filter (falls back to `RUST_LOG`) |
//! | `RD_JSON_LOGS` | `false` outside containers | JSON formatted logs |

mod config;
mod context;
mod tracing_setup;

pub use config::TelemetryConfig;
pub use context::{
    CorrelationContext, PropagatedContext, TraceContext, DEVICE_KEY, EXCHANGE_KEY, ROUTE_KEY,
    SPAN_ID_KEY, THREAD_KEY, TRACE_ID_KEY,
};
pub use tracing_setup::TracingGuard;

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to initialize OpenTelemetry tracer: {0}")]
    TracerInit(String),

    #[error("Failed to install log subscriber: {0}")]
    SubscriberInit(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Initialize logging and (optionally) trace export.
///
/// Returns a guard that must be held for the lifetime of the application.
/// When OTLP export is enabled this must be called from within a tokio
/// runtime.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    let tracing_guard = tracing_setup::init_tracing(config)?;

    Ok(TelemetryGuard {
        _tracing: tracing_guard,
    })
}

/// Guard that keeps telemetry active. Drop to flush and shutdown.
pub struct TelemetryGuard {
    _tracing: TracingGuard,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::info!("Shutting down telemetry...");
    }
}
