//! Runtime configuration: the device, telemetry and process settings.

use device_telemetry::TelemetryConfig;
use route_device::DeviceConfig;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file {}: {reason}", path.display())]
    Parse { path: PathBuf, reason: String },
}

/// Everything the runtime binary needs to host a device.
///
/// ```toml
/// pid_file = "/run/route-device.pid"
///
/// [device]
/// device_name = "route/orders/1"
/// resource_root = "/opt/route-device"
/// auto_start = true
/// ```
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub device: DeviceConfig,

    /// Exclusive PID file; `None` runs without one
    pub pid_file: Option<PathBuf>,

    #[serde(skip)]
    pub telemetry: TelemetryConfig,
}

impl RuntimeConfig {
    /// Configuration from `RD_*` environment variables only.
    pub fn from_env() -> Self {
        let device = DeviceConfig::from_env();
        let telemetry = TelemetryConfig::for_device(&device.device_name);
        Self {
            device,
            pid_file: env::var("RD_PID_FILE").ok().map(PathBuf::from),
            telemetry,
        }
    }

    /// Configuration from a TOML file; telemetry still comes from the
    /// environment.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: Self = toml::from_str(&text).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        config.telemetry = TelemetryConfig::for_device(&config.device.device_name);
        Ok(config)
    }

    /// Read the file named by `RD_CONFIG` if set, otherwise the environment.
    pub fn load() -> Result<Self, ConfigError> {
        match env::var("RD_CONFIG") {
            Ok(path) if !path.trim().is_empty() => Self::from_file(Path::new(&path)),
            _ => Ok(Self::from_env()),
        }
    }
}
