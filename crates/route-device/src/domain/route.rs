//! Route definitions and the exchanges that flow through them.

use super::fault::DomainFault;
use crate::ports::outbound::FaultHook;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

/// The declarative part of a route, as written in the definition source.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteDescriptor {
    pub id: String,
    /// Endpoint the route consumes from
    pub from: String,
    /// Processor names applied in order
    #[serde(default)]
    pub steps: Vec<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl RouteDescriptor {
    pub fn new(id: impl Into<String>, from: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            from: from.into(),
            steps: Vec::new(),
            description: None,
        }
    }

    pub fn with_step(mut self, processor: impl Into<String>) -> Self {
        self.steps.push(processor.into());
        self
    }
}

/// A route plus the fault hooks attached to it.
#[derive(Clone)]
pub struct RouteDefinition {
    descriptor: RouteDescriptor,
    fault_hooks: Vec<Arc<dyn FaultHook>>,
}

impl RouteDefinition {
    pub fn new(descriptor: RouteDescriptor) -> Self {
        Self {
            descriptor,
            fault_hooks: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.descriptor.id
    }

    pub fn descriptor(&self) -> &RouteDescriptor {
        &self.descriptor
    }

    /// Attach a hook invoked for every domain fault this route raises.
    pub fn on_fault(&mut self, hook: Arc<dyn FaultHook>) {
        self.fault_hooks.push(hook);
    }

    pub fn fault_hooks(&self) -> &[Arc<dyn FaultHook>] {
        &self.fault_hooks
    }
}

impl fmt::Debug for RouteDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteDefinition")
            .field("descriptor", &self.descriptor)
            .field("fault_hooks", &self.fault_hooks.len())
            .finish()
    }
}

/// Ordered collection of routes produced by loading a definition source.
///
/// Mutable only until it is handed to `register`, which takes ownership.
#[derive(Clone, Debug, Default)]
pub struct RouteDefinitionSet {
    routes: Vec<RouteDefinition>,
}

impl RouteDefinitionSet {
    pub fn new(routes: Vec<RouteDefinition>) -> Self {
        Self { routes }
    }

    /// Route ids in declaration order.
    pub fn ids(&self) -> Vec<String> {
        self.routes.iter().map(|r| r.id().to_string()).collect()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RouteDefinition> {
        self.routes.iter()
    }

    /// Attach `hook` to every route in the set.
    pub fn attach_fault_hook(&mut self, hook: Arc<dyn FaultHook>) {
        for route in &mut self.routes {
            route.on_fault(Arc::clone(&hook));
        }
    }

    pub fn into_routes(self) -> Vec<RouteDefinition> {
        self.routes
    }
}

impl FromIterator<RouteDescriptor> for RouteDefinitionSet {
    fn from_iter<I: IntoIterator<Item = RouteDescriptor>>(iter: I) -> Self {
        Self::new(iter.into_iter().map(RouteDefinition::new).collect())
    }
}

/// A message travelling through one route.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Exchange {
    pub id: Uuid,
    pub route_id: String,
    pub body: serde_json::Value,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

impl Exchange {
    pub fn new(route_id: impl Into<String>, body: serde_json::Value) -> Self {
        Self {
            id: Uuid::new_v4(),
            route_id: route_id.into(),
            body,
            headers: BTreeMap::new(),
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.headers.insert(name.into(), value.into());
    }
}

/// Why a processor could not handle an exchange.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ProcessingError {
    /// Business-level failure; routed to the fault hooks
    #[error("Domain fault: {0}")]
    Domain(DomainFault),

    /// Anything else; logged by the engine, no device transition
    #[error("Processing failed: {0}")]
    Runtime(String),
}

impl From<DomainFault> for ProcessingError {
    fn from(fault: DomainFault) -> Self {
        Self::Domain(fault)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingHook {
        calls: AtomicUsize,
    }

    impl FaultHook for CountingHook {
        fn on_fault(&self, _route_id: &str, _exchange: &Exchange, _fault: &DomainFault) {
            self.calls.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn set_of(ids: &[&str]) -> RouteDefinitionSet {
        ids.iter()
            .map(|id| RouteDescriptor::new(*id, format!("direct:{id}")))
            .collect()
    }

    #[test]
    fn test_ids_keep_declaration_order() {
        let set = set_of(&["zeta", "alpha", "mid"]);
        assert_eq!(set.ids(), vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_attach_fault_hook_covers_every_route() {
        let mut set = set_of(&["a", "b", "c"]);
        let hook = Arc::new(CountingHook::default());
        set.attach_fault_hook(hook.clone());

        let exchange = Exchange::new("a", serde_json::Value::Null);
        let fault = DomainFault::new("R", "d", "o");
        for route in set.iter() {
            assert_eq!(route.fault_hooks().len(), 1);
            for hook in route.fault_hooks() {
                hook.on_fault(route.id(), &exchange, &fault);
            }
        }
        assert_eq!(hook.calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_exchange_ids_are_unique() {
        let a = Exchange::new("r", serde_json::json!({"n": 1}));
        let b = Exchange::new("r", serde_json::json!({"n": 1}));
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_descriptor_steps_default_to_empty() {
        let descriptor: RouteDescriptor =
            toml::from_str("id = \"orders\"\nfrom = \"timer:orders\"").unwrap();
        assert!(descriptor.steps.is_empty());
        assert!(descriptor.description.is_none());
    }
}
