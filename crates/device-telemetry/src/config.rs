//! Telemetry configuration from environment variables.

use std::env;

/// Configuration for logging and trace export.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Service name for traces and logs
    pub service_name: String,

    /// Device name added to the service name in exported traces
    pub device_name: Option<String>,

    /// OpenTelemetry OTLP endpoint; `None` disables export
    pub otlp_endpoint: Option<String>,

    /// Log level filter (trace, debug, info, warn, error)
    pub log_level: String,

    /// Whether to enable JSON formatted logs
    pub json_logs: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "route-device".to_string(),
            device_name: None,
            otlp_endpoint: None,
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}

impl TelemetryConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `OTEL_SERVICE_NAME`: Service name (default: route-device)
    /// - `OTEL_EXPORTER_OTLP_ENDPOINT`: OTLP endpoint (default: export disabled)
    /// - `RD_LOG_LEVEL` or `RUST_LOG`: Log level (default: info)
    /// - `RD_JSON_LOGS`: Enable JSON logs (default: false in dev, true in containers)
    pub fn from_env() -> Self {
        let is_container =
            env::var("KUBERNETES_SERVICE_HOST").is_ok() || env::var("DOCKER_CONTAINER").is_ok();

        Self {
            service_name: env::var("OTEL_SERVICE_NAME")
                .unwrap_or_else(|_| "route-device".to_string()),

            device_name: None,

            otlp_endpoint: env::var("OTEL_EXPORTER_OTLP_ENDPOINT")
                .ok()
                .filter(|v| !v.trim().is_empty()),

            log_level: env::var("RD_LOG_LEVEL")
                .or_else(|_| env::var("RUST_LOG"))
                .unwrap_or_else(|_| "info".to_string()),

            json_logs: env::var("RD_JSON_LOGS")
                .map(|v| v.to_lowercase() == "true" || v == "1")
                .unwrap_or(is_container),
        }
    }

    /// Create configuration for a specific device.
    pub fn for_device(device_name: &str) -> Self {
        let mut config = Self::from_env();
        config.device_name = Some(device_name.to_string());
        config
    }

    /// Get the full service name including the device.
    pub fn full_service_name(&self) -> String {
        match &self.device_name {
            Some(device) => format!("{}:{}", self.service_name, device),
            None => self.service_name.clone(),
        }
    }

    /// Whether traces are exported over OTLP.
    pub fn otlp_enabled(&self) -> bool {
        self.otlp_endpoint.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TelemetryConfig::default();
        assert_eq!(config.service_name, "route-device");
        assert_eq!(config.log_level, "info");
        assert!(!config.otlp_enabled());
    }

    #[test]
    fn test_full_service_name() {
        let mut config = TelemetryConfig::default();
        assert_eq!(config.full_service_name(), "route-device");

        config.device_name = Some("test/route/1".to_string());
        assert_eq!(config.full_service_name(), "route-device:test/route/1");
    }
}
