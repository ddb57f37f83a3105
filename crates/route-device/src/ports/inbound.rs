//! Driving Ports (API - Inbound)
//!
//! The surface a remote control transport binds to: four commands, polled
//! attributes and change notifications.

use crate::error::LifecycleResult;
use async_trait::async_trait;
use device_bus::{EventFilter, Subscription};
use device_types::{DeviceSnapshot, DeviceState};

/// Primary device API.
#[async_trait]
pub trait DeviceApi: Send + Sync {
    /// Load the route definitions, attach the fault hook and register them.
    ///
    /// `UNINITIALIZED` → `ON`, or `FAULT` on failure. Rejected without a
    /// transition if the device was already initialized.
    async fn init(&self) -> LifecycleResult<()>;

    /// Start the engine: → `RUNNING`.
    async fn start(&self) -> LifecycleResult<()>;

    /// Stop the engine: → `ON`.
    async fn stop(&self) -> LifecycleResult<()>;

    /// Stop if running, release the engine and return to `UNINITIALIZED`.
    /// Never fails.
    async fn shutdown(&self);

    fn state(&self) -> DeviceState;

    fn status(&self) -> String;

    /// State and status read together.
    fn snapshot(&self) -> DeviceSnapshot;

    fn route_definition_ids(&self) -> Vec<String>;

    fn active_route_ids(&self) -> Vec<String>;

    /// Receive state and status notifications published from now on.
    fn subscribe(&self, filter: EventFilter) -> Subscription;
}
