//! Lifecycle Facade
//!
//! Binds the four commands and the polled attributes to the engine handle
//! and the state controller.
//!
//! Commands are serialized against each other by an async mutex. The
//! controller's transition lock is separate and never held while waiting on
//! the engine, so faults keep flowing while a command is in progress.

use super::controller::StateController;
use super::engine_handle::EngineHandle;
use super::interceptor::FaultInterceptor;
use crate::config::DeviceConfig;
use crate::domain::{Command, LifecycleEvent};
use crate::error::{ConfigurationError, EngineError, LifecycleError, LifecycleResult};
use crate::ports::inbound::DeviceApi;
use crate::ports::outbound::{EngineFactory, FaultHook, ResourceLoader};
use async_trait::async_trait;
use device_bus::{
    spawn_observer, DeviceObserver, EventFilter, EventStream, InMemoryEventBus, ObserverHandle,
    Subscription,
};
use device_telemetry::{CorrelationContext, DEVICE_KEY};
use device_types::{DeviceSnapshot, DeviceState};
use parking_lot::RwLock;
use std::sync::{Arc, Weak};
use tokio::sync::Mutex;
use tracing::{error, info, warn};

/// A routing engine exposed as a controllable device.
pub struct LifecycleService {
    config: DeviceConfig,
    bus: Arc<InMemoryEventBus>,
    controller: Arc<StateController>,
    loader: Arc<dyn ResourceLoader>,
    engine_factory: EngineFactory,
    engine: RwLock<Option<EngineHandle>>,
    commands: Mutex<()>,
    base_context: CorrelationContext,
}

impl LifecycleService {
    pub fn new(
        config: DeviceConfig,
        loader: Arc<dyn ResourceLoader>,
        engine_factory: EngineFactory,
    ) -> Self {
        let bus = Arc::new(InMemoryEventBus::with_capacity(config.event_capacity));
        let controller = Arc::new(StateController::new(
            config.device_name.clone(),
            bus.clone(),
        ));
        let base_context = CorrelationContext::new().with(DEVICE_KEY, config.device_name.clone());

        Self {
            config,
            bus,
            controller,
            loader,
            engine_factory,
            engine: RwLock::new(None),
            commands: Mutex::new(()),
            base_context,
        }
    }

    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    pub fn event_bus(&self) -> &Arc<InMemoryEventBus> {
        &self.bus
    }

    /// Forward notifications to a callback observer without keeping it alive.
    pub fn register_observer(
        &self,
        observer: Weak<dyn DeviceObserver>,
        filter: EventFilter,
    ) -> ObserverHandle {
        spawn_observer(&self.bus, observer, filter)
    }

    pub fn event_stream(&self, filter: EventFilter) -> EventStream {
        self.bus.event_stream(filter)
    }

    fn current_engine(&self) -> Option<EngineHandle> {
        self.engine.read().clone()
    }

    fn require_engine(&self) -> LifecycleResult<EngineHandle> {
        self.current_engine()
            .ok_or_else(|| LifecycleError::NotInitialized {
                state: self.controller.state(),
            })
    }

    fn build_engine(&self) -> LifecycleResult<EngineHandle> {
        let engine = EngineHandle::new((self.engine_factory)()?);

        let source = self
            .loader
            .load_resource(&self.config.resource_namespace, &self.config.routes_file)
            .map_err(ConfigurationError::from)?;
        let mut set = engine.load(&source)?;

        let hook: Arc<dyn FaultHook> = Arc::new(FaultInterceptor::new(
            self.controller.clone(),
            self.base_context.clone(),
        ));
        engine.attach_fault_hook(&mut set, hook);
        engine.register(set)?;

        Ok(engine)
    }

    fn record_failure(&self, command: Command, err: &EngineError) {
        warn!(
            device = %self.config.device_name,
            command = %command,
            error = %err,
            "Command failed"
        );
        let reason = err.to_string();
        let event = if err.is_precondition() {
            LifecycleEvent::CommandRejected { command, reason }
        } else {
            LifecycleEvent::CommandFailed { command, reason }
        };
        self.controller.apply_transition(event);
    }
}

#[async_trait]
impl DeviceApi for LifecycleService {
    async fn init(&self) -> LifecycleResult<()> {
        let _command = self.commands.lock().await;

        let state = self.controller.state();
        if state != DeviceState::Uninitialized {
            warn!(
                device = %self.config.device_name,
                command = %Command::Init,
                state = %state,
                "Command rejected, device already initialized"
            );
            return Err(ConfigurationError::AlreadyInitialized { state }.into());
        }

        match self.build_engine() {
            Ok(engine) => {
                let routes = engine.list_route_ids();
                *self.engine.write() = Some(engine);
                self.controller.apply_transition(LifecycleEvent::Initialized);
                info!(device = %self.config.device_name, routes = ?routes, "Device initialized");
                Ok(())
            }
            Err(err) => {
                error!(
                    device = %self.config.device_name,
                    command = %Command::Init,
                    error = %err,
                    "Initialization failed"
                );
                self.controller.apply_transition(LifecycleEvent::InitializationFailed {
                    reason: err.to_string(),
                });
                Err(err)
            }
        }
    }

    async fn start(&self) -> LifecycleResult<()> {
        let _command = self.commands.lock().await;
        let engine = self.require_engine()?;

        match engine.start().await {
            Ok(()) => {
                self.controller.apply_transition(LifecycleEvent::Started);
                Ok(())
            }
            Err(err) => {
                self.record_failure(Command::Start, &err);
                Err(err.into())
            }
        }
    }

    async fn stop(&self) -> LifecycleResult<()> {
        let _command = self.commands.lock().await;
        let engine = self.require_engine()?;

        match engine.stop().await {
            Ok(()) => {
                self.controller.apply_transition(LifecycleEvent::Stopped);
                Ok(())
            }
            Err(EngineError::NotRunning) if self.controller.state() == DeviceState::Alarm => {
                info!(
                    device = %self.config.device_name,
                    "Engine already idle, clearing alarm"
                );
                self.controller.apply_transition(LifecycleEvent::Stopped);
                Ok(())
            }
            Err(err) => {
                self.record_failure(Command::Stop, &err);
                Err(err.into())
            }
        }
    }

    async fn shutdown(&self) {
        let _command = self.commands.lock().await;

        let engine = self.engine.write().take();
        if let Some(engine) = engine {
            if engine.is_running() {
                if let Err(err) = engine.stop().await {
                    warn!(
                        device = %self.config.device_name,
                        command = %Command::Shutdown,
                        error = %err,
                        "Stop during shutdown failed, continuing"
                    );
                }
            }
        }

        self.controller.apply_transition(LifecycleEvent::TornDown);
        info!(
            device = %self.config.device_name,
            command = %Command::Shutdown,
            "Device shut down"
        );
    }

    fn state(&self) -> DeviceState {
        self.controller.state()
    }

    fn status(&self) -> String {
        self.controller.status()
    }

    fn snapshot(&self) -> DeviceSnapshot {
        self.controller.snapshot()
    }

    fn route_definition_ids(&self) -> Vec<String> {
        self.current_engine()
            .map(|engine| engine.list_route_ids())
            .unwrap_or_default()
    }

    fn active_route_ids(&self) -> Vec<String> {
        self.current_engine()
            .map(|engine| engine.list_active_route_ids())
            .unwrap_or_default()
    }

    fn subscribe(&self, filter: EventFilter) -> Subscription {
        self.bus.subscribe(filter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{InMemoryResourceLoader, InMemoryRouteEngine, ProcessorRegistry};

    const ROUTES: &str = "[[route]]\nid = \"orders\"\nfrom = \"timer:orders\"\nsteps = [\"log\"]\n";

    fn service_with(routes: Option<&str>) -> LifecycleService {
        let config = DeviceConfig::for_testing();
        let loader = InMemoryResourceLoader::new();
        if let Some(routes) = routes {
            loader.insert(&config.resource_namespace, &config.routes_file, routes);
        }
        LifecycleService::new(
            config,
            Arc::new(loader),
            InMemoryRouteEngine::factory(ProcessorRegistry::with_builtins(), 16),
        )
    }

    #[tokio::test]
    async fn test_commands_before_init_are_rejected() {
        let service = service_with(Some(ROUTES));
        assert_eq!(
            service.start().await,
            Err(LifecycleError::NotInitialized {
                state: DeviceState::Uninitialized
            })
        );
        assert_eq!(service.snapshot(), DeviceSnapshot::initial());
        assert!(service.route_definition_ids().is_empty());
    }

    #[tokio::test]
    async fn test_missing_source_faults() {
        let service = service_with(None);
        let err = service.init().await.unwrap_err();

        assert!(matches!(
            err,
            LifecycleError::Configuration(ConfigurationError::Resource(_))
        ));
        assert_eq!(service.state(), DeviceState::Fault);
        assert_eq!(service.status(), err.to_string());
    }

    #[tokio::test]
    async fn test_second_init_is_rejected_without_transition() {
        let service = service_with(Some(ROUTES));
        service.init().await.unwrap();
        let before = service.snapshot();

        let err = service.init().await.unwrap_err();
        assert_eq!(
            err,
            LifecycleError::Configuration(ConfigurationError::AlreadyInitialized {
                state: DeviceState::On
            })
        );
        assert_eq!(service.snapshot(), before);
    }

    #[tokio::test]
    async fn test_shutdown_allows_reinit() {
        let service = service_with(Some(ROUTES));
        service.init().await.unwrap();
        service.start().await.unwrap();

        service.shutdown().await;
        assert_eq!(service.state(), DeviceState::Uninitialized);
        assert!(service.route_definition_ids().is_empty());

        service.init().await.unwrap();
        assert_eq!(service.state(), DeviceState::On);
        assert_eq!(service.route_definition_ids(), vec!["orders"]);
    }

    #[tokio::test]
    async fn test_shutdown_from_fault() {
        let service = service_with(None);
        let _ = service.init().await;
        assert_eq!(service.state(), DeviceState::Fault);

        service.shutdown().await;
        assert_eq!(service.state(), DeviceState::Uninitialized);
    }
}
