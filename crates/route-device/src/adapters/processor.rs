//! Named processors that route steps refer to.

use crate::domain::{Exchange, ProcessingError};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::info;

/// One step of a route.
pub trait Processor: Send + Sync {
    fn process(&self, exchange: &mut Exchange) -> Result<(), ProcessingError>;
}

impl<F> Processor for F
where
    F: Fn(&mut Exchange) -> Result<(), ProcessingError> + Send + Sync,
{
    fn process(&self, exchange: &mut Exchange) -> Result<(), ProcessingError> {
        self(exchange)
    }
}

/// Processors available to an engine, by name.
#[derive(Clone, Default)]
pub struct ProcessorRegistry {
    processors: HashMap<String, Arc<dyn Processor>>,
}

impl ProcessorRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the `log` and `noop` processors.
    pub fn with_builtins() -> Self {
        Self::new()
            .with_fn("noop", |_| Ok(()))
            .with_fn("log", |exchange| {
                info!(
                    route_id = %exchange.route_id,
                    exchange_id = %exchange.id,
                    body = %exchange.body,
                    "Exchange"
                );
                Ok(())
            })
    }

    /// Builder-style registration.
    pub fn with(mut self, name: impl Into<String>, processor: impl Processor + 'static) -> Self {
        self.register(name, processor);
        self
    }

    /// Builder-style registration of a closure.
    pub fn with_fn<F>(self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&mut Exchange) -> Result<(), ProcessingError> + Send + Sync + 'static,
    {
        self.with(name, f)
    }

    /// Register or replace a processor.
    pub fn register(&mut self, name: impl Into<String>, processor: impl Processor + 'static) {
        self.processors.insert(name.into(), Arc::new(processor));
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Processor>> {
        self.processors.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.processors.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.processors.keys().cloned().collect();
        names.sort();
        names
    }
}

impl fmt::Debug for ProcessorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessorRegistry")
            .field("processors", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DomainFault;

    #[test]
    fn test_builtins_registered() {
        let registry = ProcessorRegistry::with_builtins();
        assert_eq!(registry.names(), vec!["log", "noop"]);
    }

    #[test]
    fn test_closure_processor() {
        let registry = ProcessorRegistry::new()
            .with_fn("tag", |exchange| {
                exchange.set_header("tagged", "yes");
                Ok(())
            })
            .with_fn("reject", |_| {
                Err(DomainFault::new("API_Rejected", "rejected", "reject").into())
            });

        let mut exchange = Exchange::new("r", serde_json::Value::Null);
        registry
            .get("tag")
            .unwrap()
            .process(&mut exchange)
            .unwrap();
        assert_eq!(exchange.header("tagged"), Some("yes"));

        let err = registry
            .get("reject")
            .unwrap()
            .process(&mut exchange)
            .unwrap_err();
        assert!(matches!(err, ProcessingError::Domain(_)));
    }

    #[test]
    fn test_unknown_processor() {
        let registry = ProcessorRegistry::with_builtins();
        assert!(!registry.contains("enrich"));
        assert!(registry.get("enrich").is_none());
    }
}
