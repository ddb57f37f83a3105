//! Ports module for the route device

pub mod inbound;
pub mod outbound;

pub use inbound::DeviceApi;
pub use outbound::{EngineFactory, FaultHook, ResourceLoader, RoutingEngine};
