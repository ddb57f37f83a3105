//! Device configuration.

use crate::adapters::DEFAULT_MAX_ACTIVE_ROUTES;
use device_bus::DEFAULT_CHANNEL_CAPACITY;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

/// Configuration for one route device.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// Name the device is addressed by (e.g. `route/orders/1`)
    pub device_name: String,

    /// Directory resource namespaces are resolved against
    pub resource_root: PathBuf,

    /// Namespace the route definitions live in
    pub resource_namespace: String,

    /// File name of the route definitions inside the namespace
    pub routes_file: String,

    /// Notifications buffered per subscriber before it lags
    pub event_capacity: usize,

    /// Most routes the engine may run at once
    pub max_active_routes: usize,

    /// Start the engine right after a successful `init()`
    pub auto_start: bool,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            device_name: "route/device/1".to_string(),
            resource_root: PathBuf::from("."),
            resource_namespace: "etc/RouteDevice".to_string(),
            routes_file: "routes.toml".to_string(),
            event_capacity: DEFAULT_CHANNEL_CAPACITY,
            max_active_routes: DEFAULT_MAX_ACTIVE_ROUTES,
            auto_start: false,
        }
    }
}

impl DeviceConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `RD_DEVICE_NAME`
    /// - `RD_RESOURCE_ROOT`
    /// - `RD_RESOURCE_NAMESPACE`
    /// - `RD_ROUTES_FILE`
    /// - `RD_EVENT_CAPACITY`
    /// - `RD_MAX_ACTIVE_ROUTES`
    /// - `RD_AUTO_START`
    ///
    /// Unset or unparsable values keep their defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            device_name: env::var("RD_DEVICE_NAME").unwrap_or(defaults.device_name),
            resource_root: env::var("RD_RESOURCE_ROOT")
                .map(PathBuf::from)
                .unwrap_or(defaults.resource_root),
            resource_namespace: env::var("RD_RESOURCE_NAMESPACE")
                .unwrap_or(defaults.resource_namespace),
            routes_file: env::var("RD_ROUTES_FILE").unwrap_or(defaults.routes_file),
            event_capacity: env::var("RD_EVENT_CAPACITY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.event_capacity),
            max_active_routes: env::var("RD_MAX_ACTIVE_ROUTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_active_routes),
            auto_start: env::var("RD_AUTO_START")
                .map(|v| v.to_lowercase() == "true" || v == "1")
                .unwrap_or(defaults.auto_start),
        }
    }

    /// Small buffers and a fixed name for tests.
    pub fn for_testing() -> Self {
        Self {
            device_name: "test/route/1".to_string(),
            event_capacity: 64,
            max_active_routes: 16,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = DeviceConfig::default();
        assert_eq!(config.resource_namespace, "etc/RouteDevice");
        assert_eq!(config.routes_file, "routes.toml");
        assert_eq!(config.event_capacity, DEFAULT_CHANNEL_CAPACITY);
        assert!(!config.auto_start);
    }

    #[test]
    fn test_for_testing() {
        let config = DeviceConfig::for_testing();
        assert_eq!(config.device_name, "test/route/1");
        assert_eq!(config.event_capacity, 64);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let parsed: DeviceConfig =
            toml::from_str("device_name = \"route/orders/2\"\nauto_start = true").unwrap();
        assert_eq!(parsed.device_name, "route/orders/2");
        assert!(parsed.auto_start);
        assert_eq!(parsed.routes_file, "routes.toml");
    }
}
