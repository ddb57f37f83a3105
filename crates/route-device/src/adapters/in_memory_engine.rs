//! In-Memory Routing Engine
//!
//! Implements the `RoutingEngine` port. Routes come from a TOML document:
//!
//! ```toml
//! [[route]]
//! id = "orders"
//! from = "timer:orders?period=1000"
//! steps = ["validate", "log"]
//! ```
//!
//! Exchanges are pushed in with `process` (caller's thread) or `dispatch`
//! (a blocking worker). A step returning `ProcessingError::Domain` ends the
//! exchange and is reported to the route's fault hooks on that same thread.

use crate::adapters::processor::ProcessorRegistry;
use crate::domain::{
    DomainFault, Exchange, ProcessingError, RouteDefinition, RouteDefinitionSet, RouteDescriptor,
};
use crate::error::{ConfigurationError, EngineError};
use crate::ports::outbound::{EngineFactory, RoutingEngine};
use async_trait::async_trait;
use parking_lot::RwLock;
use serde::Deserialize;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Default cap on routes that may run at once.
pub const DEFAULT_MAX_ACTIVE_ROUTES: usize = 256;

#[derive(Debug, Deserialize)]
struct RoutesDocument {
    #[serde(default, rename = "route")]
    routes: Vec<RouteDescriptor>,
}

/// How an exchange ended.
#[derive(Debug, Clone, PartialEq)]
pub enum ExchangeOutcome {
    /// Every step succeeded
    Completed(Exchange),
    /// A step raised a domain fault; the fault hooks have already run
    Faulted { exchange: Exchange, fault: DomainFault },
    /// A step failed with a non-domain error
    Failed { exchange: Exchange, error: String },
}

impl ExchangeOutcome {
    pub fn exchange(&self) -> &Exchange {
        match self {
            Self::Completed(exchange)
            | Self::Faulted { exchange, .. }
            | Self::Failed { exchange, .. } => exchange,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed(_))
    }
}

#[derive(Default)]
struct EngineState {
    routes: Vec<Arc<RouteDefinition>>,
    registered: bool,
    running: bool,
}

/// Routing engine that runs exchanges through named processors.
pub struct InMemoryRouteEngine {
    processors: ProcessorRegistry,
    max_active_routes: usize,
    state: RwLock<EngineState>,
}

impl InMemoryRouteEngine {
    pub fn new(processors: ProcessorRegistry) -> Self {
        Self::with_max_active_routes(processors, DEFAULT_MAX_ACTIVE_ROUTES)
    }

    pub fn with_max_active_routes(processors: ProcessorRegistry, max_active_routes: usize) -> Self {
        Self {
            processors,
            max_active_routes,
            state: RwLock::new(EngineState::default()),
        }
    }

    /// Factory building a fresh engine over `processors` for every `init()`.
    pub fn factory(processors: ProcessorRegistry, max_active_routes: usize) -> EngineFactory {
        Box::new(move || {
            let engine: Arc<dyn RoutingEngine> = Arc::new(Self::with_max_active_routes(
                processors.clone(),
                max_active_routes,
            ));
            Ok(engine)
        })
    }

    pub fn processors(&self) -> &ProcessorRegistry {
        &self.processors
    }

    fn validate(descriptor: &RouteDescriptor) -> Result<(), ConfigurationError> {
        if descriptor.id.trim().is_empty() {
            return Err(ConfigurationError::InvalidRoute {
                route_id: descriptor.id.clone(),
                reason: "id must not be empty".to_string(),
            });
        }
        if descriptor.from.trim().is_empty() {
            return Err(ConfigurationError::InvalidRoute {
                route_id: descriptor.id.clone(),
                reason: "'from' endpoint must not be empty".to_string(),
            });
        }
        Ok(())
    }

    fn active_route(&self, route_id: &str) -> Result<Arc<RouteDefinition>, EngineError> {
        let state = self.state.read();
        let route = state
            .routes
            .iter()
            .find(|r| r.id() == route_id)
            .cloned()
            .ok_or_else(|| EngineError::UnknownRoute {
                route_id: route_id.to_string(),
            })?;

        if !state.running {
            return Err(EngineError::RouteInactive {
                route_id: route_id.to_string(),
            });
        }
        Ok(route)
    }

    /// Run one exchange through `route_id` on the calling thread.
    ///
    /// Fault hooks run before this returns.
    pub fn process(
        &self,
        route_id: &str,
        body: serde_json::Value,
    ) -> Result<ExchangeOutcome, EngineError> {
        // Clone the route out so no engine lock is held while steps and
        // hooks run.
        let route = self.active_route(route_id)?;
        let mut exchange = Exchange::new(route_id, body);
        debug!(route_id, exchange_id = %exchange.id, "Processing exchange");

        for step in &route.descriptor().steps {
            let Some(processor) = self.processors.get(step) else {
                // Registration rejects unknown processors.
                return Ok(ExchangeOutcome::Failed {
                    exchange,
                    error: format!("processor '{step}' missing"),
                });
            };

            match processor.process(&mut exchange) {
                Ok(()) => {}
                Err(ProcessingError::Domain(fault)) => {
                    if route.fault_hooks().is_empty() {
                        error!(
                            route_id,
                            exchange_id = %exchange.id,
                            fault = %fault,
                            "Unhandled domain fault"
                        );
                    }
                    for hook in route.fault_hooks() {
                        hook.on_fault(route_id, &exchange, &fault);
                    }
                    return Ok(ExchangeOutcome::Faulted { exchange, fault });
                }
                Err(ProcessingError::Runtime(reason)) => {
                    warn!(
                        route_id,
                        exchange_id = %exchange.id,
                        step = %step,
                        reason = %reason,
                        "Exchange failed"
                    );
                    return Ok(ExchangeOutcome::Failed {
                        exchange,
                        error: reason,
                    });
                }
            }
        }

        Ok(ExchangeOutcome::Completed(exchange))
    }

    /// Run one exchange on a blocking worker thread.
    ///
    /// Must be called from within a tokio runtime.
    pub fn dispatch(
        self: &Arc<Self>,
        route_id: impl Into<String>,
        body: serde_json::Value,
    ) -> JoinHandle<Result<ExchangeOutcome, EngineError>> {
        let engine = Arc::clone(self);
        let route_id = route_id.into();
        tokio::task::spawn_blocking(move || engine.process(&route_id, body))
    }
}

#[async_trait]
impl RoutingEngine for InMemoryRouteEngine {
    fn load(&self, source: &[u8]) -> Result<RouteDefinitionSet, ConfigurationError> {
        let text = std::str::from_utf8(source).map_err(|e| ConfigurationError::Malformed {
            reason: format!("not UTF-8: {e}"),
        })?;
        let document: RoutesDocument =
            toml::from_str(text).map_err(|e| ConfigurationError::Malformed {
                reason: e.to_string(),
            })?;

        if document.routes.is_empty() {
            return Err(ConfigurationError::NoRoutes);
        }
        for descriptor in &document.routes {
            Self::validate(descriptor)?;
        }

        debug!(routes = document.routes.len(), "Route definitions loaded");
        Ok(document.routes.into_iter().collect())
    }

    fn register(&self, set: RouteDefinitionSet) -> Result<(), EngineError> {
        let mut state = self.state.write();
        if state.registered {
            return Err(EngineError::AlreadyRegistered);
        }

        let mut seen = HashSet::new();
        for route in set.iter() {
            if !seen.insert(route.id().to_string()) {
                return Err(EngineError::DuplicateRoute {
                    route_id: route.id().to_string(),
                });
            }
            if let Some(missing) = route
                .descriptor()
                .steps
                .iter()
                .find(|step| !self.processors.contains(step))
            {
                return Err(EngineError::UnknownProcessor {
                    route_id: route.id().to_string(),
                    processor: missing.clone(),
                });
            }
        }

        state.routes = set.into_routes().into_iter().map(Arc::new).collect();
        state.registered = true;
        info!(routes = state.routes.len(), "Routes registered");
        Ok(())
    }

    async fn start(&self) -> Result<(), EngineError> {
        let mut state = self.state.write();
        if state.running {
            return Err(EngineError::AlreadyRunning);
        }
        if state.routes.len() > self.max_active_routes {
            return Err(EngineError::ResourceExhausted {
                reason: format!(
                    "{} routes exceed the limit of {} active routes",
                    state.routes.len(),
                    self.max_active_routes
                ),
            });
        }

        state.running = true;
        for route in &state.routes {
            debug!(route_id = route.id(), from = %route.descriptor().from, "Route started");
        }
        info!(routes = state.routes.len(), "Routing engine started");
        Ok(())
    }

    async fn stop(&self) -> Result<(), EngineError> {
        let mut state = self.state.write();
        if !state.running {
            return Err(EngineError::NotRunning);
        }
        state.running = false;
        info!("Routing engine stopped");
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.state.read().running
    }

    fn route_definition_ids(&self) -> Vec<String> {
        self.state
            .read()
            .routes
            .iter()
            .map(|r| r.id().to_string())
            .collect()
    }

    fn active_route_ids(&self) -> Vec<String> {
        let state = self.state.read();
        if !state.running {
            return Vec::new();
        }
        state.routes.iter().map(|r| r.id().to_string()).collect()
    }
}
