//! # Device Runtime
//!
//! Process wiring for a single route device: configuration loading, an
//! exclusive PID file and the boot/shutdown sequence around
//! [`route_device::LifecycleService`].
//!
//! ## Startup Sequence
//!
//! 1. Load configuration (`RD_CONFIG` file or `RD_*` environment)
//! 2. Initialize telemetry
//! 3. Acquire the PID file, if configured
//! 4. `init()`, then `start()` when `auto_start` is set
//! 5. Wait for Ctrl+C, then `shutdown()`

pub mod config;
pub mod pid;
pub mod runtime;

pub use config::{ConfigError, RuntimeConfig};
pub use pid::{PidFile, PidFileError};
pub use runtime::DeviceRuntime;
