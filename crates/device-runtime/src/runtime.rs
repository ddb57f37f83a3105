//! # Device Runtime
//!
//! Hosts one [`LifecycleService`] over the filesystem resource loader and the
//! in-memory engine. Boot runs `init()` and optionally `start()`; a failed
//! boot leaves the device in its FAULT or ALARM state for operators to read
//! instead of exiting.

use crate::config::RuntimeConfig;
use route_device::{
    DeviceApi, DeviceObserver, DeviceState, EventFilter, FsResourceLoader, InMemoryRouteEngine,
    LifecycleResult, LifecycleService, ObserverHandle, ProcessorRegistry,
};
use std::future::Future;
use std::sync::{Arc, Weak};
use tracing::{error, info};

/// Logs every notification the device pushes.
struct LoggingObserver;

impl DeviceObserver for LoggingObserver {
    fn on_state_changed(&self, device: &str, state: DeviceState, sequence: u64) {
        info!(device, state = %state, sequence, "State changed");
    }

    fn on_status_changed(&self, device: &str, status: &str, sequence: u64) {
        info!(device, status, sequence, "Status changed");
    }
}

pub struct DeviceRuntime {
    config: RuntimeConfig,
    service: Arc<LifecycleService>,
    _observer: Arc<dyn DeviceObserver>,
    observer_task: ObserverHandle,
}

impl DeviceRuntime {
    /// Must be called from within a tokio runtime.
    pub fn new(config: RuntimeConfig) -> Self {
        let device = config.device.clone();
        let loader = Arc::new(FsResourceLoader::new(device.resource_root.clone()));
        let factory = InMemoryRouteEngine::factory(
            ProcessorRegistry::with_builtins(),
            device.max_active_routes,
        );
        let service = Arc::new(LifecycleService::new(device, loader, factory));

        let observer: Arc<dyn DeviceObserver> = Arc::new(LoggingObserver);
        let weak: Weak<dyn DeviceObserver> = Arc::downgrade(&observer);
        let observer_task = service.register_observer(weak, EventFilter::all());

        Self {
            config,
            service,
            _observer: observer,
            observer_task,
        }
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn service(&self) -> &Arc<LifecycleService> {
        &self.service
    }

    /// Initialize the device, then start it when `auto_start` is set.
    pub async fn bootstrap(&self) -> LifecycleResult<()> {
        self.service.init().await?;
        if self.config.device.auto_start {
            self.service.start().await?;
        }
        Ok(())
    }

    /// Boot, serve until `shutdown` resolves, then tear the device down and
    /// stop forwarding notifications to the log.
    pub async fn run_until<F>(&self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        if let Err(err) = self.bootstrap().await {
            let snapshot = self.service.snapshot();
            error!(
                device = %self.config.device.device_name,
                error = %err,
                state = %snapshot.state,
                "Boot failed, device stays up for inspection"
            );
        }

        info!(
            device = %self.config.device.device_name,
            state = %self.service.state(),
            "Device runtime ready"
        );
        shutdown.await;

        info!(device = %self.config.device.device_name, "Shutting down");
        self.service.shutdown().await;
        self.observer_task.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use route_device::DeviceConfig;
    use std::path::Path;
    use std::time::Duration;
    use tokio::time::timeout;

    const ROUTES: &str = "[[route]]\nid = \"orders\"\nfrom = \"timer:orders\"\nsteps = [\"log\"]\n";

    fn config_in(root: &Path, auto_start: bool) -> RuntimeConfig {
        RuntimeConfig {
            device: DeviceConfig {
                resource_root: root.to_path_buf(),
                auto_start,
                ..DeviceConfig::for_testing()
            },
            ..RuntimeConfig::default()
        }
    }

    fn write_routes(root: &Path) {
        let dir = root.join("etc/RouteDevice");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("routes.toml"), ROUTES).unwrap();
    }

    #[tokio::test]
    async fn test_bootstrap_initializes() {
        let dir = tempfile::tempdir().unwrap();
        write_routes(dir.path());
        let runtime = DeviceRuntime::new(config_in(dir.path(), false));

        runtime.bootstrap().await.unwrap();

        assert_eq!(runtime.service().state(), DeviceState::On);
        assert_eq!(runtime.service().route_definition_ids(), vec!["orders"]);
    }

    #[tokio::test]
    async fn test_bootstrap_auto_start() {
        let dir = tempfile::tempdir().unwrap();
        write_routes(dir.path());
        let runtime = DeviceRuntime::new(config_in(dir.path(), true));

        runtime.bootstrap().await.unwrap();

        assert_eq!(runtime.service().state(), DeviceState::Running);
        assert_eq!(runtime.service().active_route_ids(), vec!["orders"]);
    }

    #[tokio::test]
    async fn test_run_until_survives_failed_boot() {
        let dir = tempfile::tempdir().unwrap();
        let runtime = DeviceRuntime::new(config_in(dir.path(), true));
        let service = runtime.service().clone();

        runtime
            .run_until(async move {
                assert_eq!(service.state(), DeviceState::Fault);
            })
            .await;

        assert_eq!(runtime.service().state(), DeviceState::Uninitialized);
    }

    #[tokio::test]
    async fn test_run_until_stops_observer_task() {
        let dir = tempfile::tempdir().unwrap();
        write_routes(dir.path());
        let runtime = DeviceRuntime::new(config_in(dir.path(), false));
        assert!(!runtime.observer_task.is_finished());

        runtime.run_until(async {}).await;

        timeout(Duration::from_secs(1), async {
            while !runtime.observer_task.is_finished() {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("observer task should stop after shutdown");
    }

    #[tokio::test]
    async fn test_failed_boot_reports_fault() {
        let dir = tempfile::tempdir().unwrap();
        let runtime = DeviceRuntime::new(config_in(dir.path(), false));

        assert!(runtime.bootstrap().await.is_err());
        assert_eq!(runtime.service().state(), DeviceState::Fault);
        assert!(runtime.service().status().contains("routes.toml"));

        runtime.service().shutdown().await;
        assert_eq!(runtime.service().state(), DeviceState::Uninitialized);
    }
}
