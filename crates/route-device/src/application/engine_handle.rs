//! Engine Handle
//!
//! Thin wrapper the facade uses to drive a `RoutingEngine`, adding logging
//! around each call. Cheap to clone.

use crate::domain::RouteDefinitionSet;
use crate::error::{ConfigurationError, EngineError};
use crate::ports::outbound::{FaultHook, RoutingEngine};
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Clone)]
pub struct EngineHandle {
    engine: Arc<dyn RoutingEngine>,
}

impl EngineHandle {
    pub fn new(engine: Arc<dyn RoutingEngine>) -> Self {
        Self { engine }
    }

    pub fn load(&self, source: &[u8]) -> Result<RouteDefinitionSet, ConfigurationError> {
        let set = self.engine.load(source).map_err(|e| {
            warn!(error = %e, "Route definitions rejected");
            e
        })?;
        debug!(routes = ?set.ids(), "Route definitions parsed");
        Ok(set)
    }

    pub fn attach_fault_hook(&self, set: &mut RouteDefinitionSet, hook: Arc<dyn FaultHook>) {
        self.engine.attach_fault_hook(set, hook);
        debug!(routes = set.len(), "Fault hook attached");
    }

    pub fn register(&self, set: RouteDefinitionSet) -> Result<(), EngineError> {
        let count = set.len();
        self.engine.register(set)?;
        info!(routes = count, "Route definitions registered");
        Ok(())
    }

    pub async fn start(&self) -> Result<(), EngineError> {
        self.engine.start().await?;
        info!(active = ?self.engine.active_route_ids(), "Engine started");
        Ok(())
    }

    pub async fn stop(&self) -> Result<(), EngineError> {
        self.engine.stop().await?;
        info!("Engine stopped");
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.engine.is_running()
    }

    pub fn list_route_ids(&self) -> Vec<String> {
        self.engine.route_definition_ids()
    }

    pub fn list_active_route_ids(&self) -> Vec<String> {
        self.engine.active_route_ids()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{InMemoryRouteEngine, ProcessorRegistry};

    #[tokio::test]
    async fn test_handle_delegates() {
        let handle = EngineHandle::new(Arc::new(InMemoryRouteEngine::new(
            ProcessorRegistry::with_builtins(),
        )));
        let set = handle
            .load(b"[[route]]\nid = \"a\"\nfrom = \"direct:a\"\n[[route]]\nid = \"b\"\nfrom = \"direct:b\"")
            .unwrap();
        handle.register(set).unwrap();
        assert_eq!(handle.list_route_ids(), vec!["a", "b"]);
        assert!(handle.list_active_route_ids().is_empty());

        handle.start().await.unwrap();
        assert!(handle.is_running());
        assert_eq!(handle.list_active_route_ids(), vec!["a", "b"]);

        handle.stop().await.unwrap();
        assert_eq!(handle.stop().await, Err(EngineError::NotRunning));
    }
}
