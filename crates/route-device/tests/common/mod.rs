//! Shared fixtures for the route device integration tests.

#![allow(dead_code)]

use parking_lot::Mutex;
use route_device::{
    DeviceConfig, DomainFault, EngineFactory, InMemoryResourceLoader, InMemoryRouteEngine,
    LifecycleService, ProcessorRegistry, RoutingEngine,
};
use std::sync::Arc;

pub const ROUTES: &str = r#"
[[route]]
id = "orders"
from = "timer:orders?period=1000"
steps = ["log"]

[[route]]
id = "billing"
from = "direct:billing"
steps = ["charge", "log"]

[[route]]
id = "audit"
from = "direct:audit"
steps = ["noop"]
"#;

pub const ROUTE_IDS: [&str; 3] = ["orders", "billing", "audit"];

/// Builtins plus `charge`, which raises a domain fault for negative amounts.
pub fn processors() -> ProcessorRegistry {
    ProcessorRegistry::with_builtins().with_fn("charge", |exchange| {
        let amount = exchange.body["amount"].as_i64().unwrap_or(0);
        if amount < 0 {
            return Err(charge_fault(amount).into());
        }
        exchange.set_header("charged", amount.to_string());
        Ok(())
    })
}

pub fn charge_fault(amount: i64) -> DomainFault {
    DomainFault::new(
        "API_NegativeAmount",
        format!("amount {amount} must not be negative"),
        "billing/charge",
    )
}

pub fn charge(amount: i64) -> serde_json::Value {
    serde_json::json!({ "amount": amount })
}

/// A service over the in-memory engine and loader, with access to the engine
/// the last `init()` built.
pub struct Harness {
    pub service: Arc<LifecycleService>,
    pub loader: Arc<InMemoryResourceLoader>,
    engine: Arc<Mutex<Option<Arc<InMemoryRouteEngine>>>>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with(Some(ROUTES), DeviceConfig::for_testing())
    }

    pub fn with(routes: Option<&str>, config: DeviceConfig) -> Self {
        let loader = Arc::new(InMemoryResourceLoader::new());
        if let Some(routes) = routes {
            loader.insert(&config.resource_namespace, &config.routes_file, routes);
        }

        let slot: Arc<Mutex<Option<Arc<InMemoryRouteEngine>>>> = Arc::new(Mutex::new(None));
        let factory: EngineFactory = {
            let slot = slot.clone();
            let max_active_routes = config.max_active_routes;
            Box::new(move || {
                let engine = Arc::new(InMemoryRouteEngine::with_max_active_routes(
                    processors(),
                    max_active_routes,
                ));
                *slot.lock() = Some(engine.clone());
                let engine: Arc<dyn RoutingEngine> = engine;
                Ok(engine)
            })
        };

        let service = Arc::new(LifecycleService::new(config, loader.clone(), factory));
        Self {
            service,
            loader,
            engine: slot,
        }
    }

    /// The engine built by the most recent `init()`.
    pub fn engine(&self) -> Arc<InMemoryRouteEngine> {
        self.engine
            .lock()
            .clone()
            .expect("init() has not built an engine yet")
    }
}
