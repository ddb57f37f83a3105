//! # Device Types Crate
//!
//! Vocabulary shared by every crate in the workspace: the lifecycle state of
//! the device and the consistent state/status pair observers read.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: `DeviceState` is defined once here and used by
//!   the controller, the event bus and the runtime.
//! - **Pairs, not fields**: state and status are always read together through
//!   `DeviceSnapshot`, never as two separate loads.

pub mod state;

pub use state::{DeviceSnapshot, DeviceState, INITIAL_STATUS};
