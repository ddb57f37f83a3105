//! Driven Ports (SPI - Outbound)
//!
//! What the device needs from its environment: a routing engine, somewhere
//! to read route definitions from, and a callback the engine invokes on
//! domain faults.

use crate::domain::{DomainFault, Exchange, RouteDefinitionSet};
use crate::error::{ConfigurationError, EngineError, ResourceError};
use async_trait::async_trait;
use std::sync::Arc;

/// Callback invoked by the engine when a route raises a domain fault.
///
/// Runs synchronously on the engine worker that caught the fault, before
/// the engine continues with the next exchange.
pub trait FaultHook: Send + Sync {
    fn on_fault(&self, route_id: &str, exchange: &Exchange, fault: &DomainFault);
}

/// Message-routing engine the device controls.
#[async_trait]
pub trait RoutingEngine: Send + Sync {
    /// Parse a definition source into routes.
    fn load(&self, source: &[u8]) -> Result<RouteDefinitionSet, ConfigurationError>;

    /// Attach `hook` to every route in `set`.
    fn attach_fault_hook(&self, set: &mut RouteDefinitionSet, hook: Arc<dyn FaultHook>) {
        set.attach_fault_hook(hook);
    }

    /// Hand the definitions to the engine. The set cannot change afterwards.
    fn register(&self, set: RouteDefinitionSet) -> Result<(), EngineError>;

    /// Start every registered route.
    async fn start(&self) -> Result<(), EngineError>;

    /// Stop every running route.
    async fn stop(&self) -> Result<(), EngineError>;

    fn is_running(&self) -> bool;

    /// Registered route ids in registration order.
    fn route_definition_ids(&self) -> Vec<String>;

    /// Ids of the routes currently consuming, in registration order.
    fn active_route_ids(&self) -> Vec<String>;
}

/// Source of named configuration resources.
pub trait ResourceLoader: Send + Sync {
    fn load_resource(&self, namespace: &str, filename: &str) -> Result<Vec<u8>, ResourceError>;
}

/// Builds a fresh engine for each `init()`.
pub type EngineFactory =
    Box<dyn Fn() -> Result<Arc<dyn RoutingEngine>, EngineError> + Send + Sync>;
