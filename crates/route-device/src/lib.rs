//! # route-device
//!
//! Exposes a message-routing engine as a remotely controllable device.
//!
//! ## Overview
//!
//! - **Commands**: `init`, `start`, `stop`, `shutdown`
//! - **Attributes**: state, status, route definition ids, active route ids
//! - **Notifications**: state-changed and status-changed events
//! - **Fault handling**: domain faults raised on engine workers move the
//!   device to `ALARM` before the engine continues
//!
//! ## Lifecycle
//!
//! ```text
//! [UNINITIALIZED] ──init──→ [ON] ──start──→ [RUNNING]
//!        │                   ↑ ↑               │  │
//!        │ init failed       │ └─────stop──────┘  │ domain fault
//!        ↓                   │                    ↓
//!     [FAULT]                └──────stop────── [ALARM]
//!
//! shutdown: any state ──→ [UNINITIALIZED]
//! ```
//!
//! ## Architecture
//!
//! ```text
//! Transport ──DeviceApi──→ LifecycleService ──→ EngineHandle ──→ RoutingEngine
//!                               │                                   │ worker thread
//!                               ↓                                   ↓
//!                         StateController ←──report_fault── FaultInterceptor
//!                               │
//!                               └──publish──→ InMemoryEventBus ──→ observers
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use route_device::{
//!     DeviceApi, DeviceConfig, FsResourceLoader, InMemoryRouteEngine, LifecycleService,
//!     ProcessorRegistry,
//! };
//!
//! let config = DeviceConfig::from_env();
//! let service = LifecycleService::new(
//!     config.clone(),
//!     Arc::new(FsResourceLoader::new(&config.resource_root)),
//!     InMemoryRouteEngine::factory(ProcessorRegistry::with_builtins(), config.max_active_routes),
//! );
//!
//! service.init().await?;
//! service.start().await?;
//! ```

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod metrics;
pub mod ports;

pub use adapters::{
    ExchangeOutcome, FsResourceLoader, InMemoryResourceLoader, InMemoryRouteEngine, Processor,
    ProcessorRegistry,
};
pub use application::{EngineHandle, FaultInterceptor, LifecycleService, StateController};
pub use config::DeviceConfig;
pub use domain::{
    Command, DomainFault, Exchange, FaultDetail, FaultRecord, FaultSeverity, LifecycleEvent,
    ProcessingError, RouteDefinition, RouteDefinitionSet, RouteDescriptor, Transition,
};
pub use error::{
    ConfigurationError, EngineError, LifecycleError, LifecycleResult, ResourceError,
};
pub use ports::{DeviceApi, EngineFactory, FaultHook, ResourceLoader, RoutingEngine};

pub use device_bus::{
    DeviceEvent, DeviceObserver, EventFilter, EventTopic, ObserverHandle, Subscription,
};
pub use device_types::{DeviceSnapshot, DeviceState};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
