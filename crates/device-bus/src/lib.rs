//! # Device Bus - Change Notifications for Device Observers
//!
//! Delivers state-changed and status-changed events from the state
//! controller to every currently registered observer.
//!
//! ## Delivery Model
//!
//! ```text
//! ┌──────────────────┐   publish()    ┌──────────────┐   recv()   ┌────────────┐
//! │ State Controller │ ─────────────→ │  Event Bus   │ ─────────→ │ Observer A │
//! │ (any thread)     │  non-blocking  │ (broadcast)  │ ─────────→ │ Observer B │
//! └──────────────────┘                └──────────────┘            └────────────┘
//! ```
//!
//! - State and status are independent channels (`EventTopic::State`,
//!   `EventTopic::Status`).
//! - Publishing never blocks and never fails the caller: with no observers the
//!   event is counted as dropped and logged.
//! - An observer only sees events published after it subscribed.
//! - Callback observers are held through `Weak`; the bus never keeps one alive.

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod events;
pub mod observer;
pub mod publisher;
pub mod subscriber;

// Re-export main types
pub use events::{DeviceEvent, EventFilter, EventTopic};
pub use observer::{spawn_observer, DeviceObserver, ObserverHandle};
pub use publisher::{EventPublisher, InMemoryEventBus};
pub use subscriber::{EventStream, Subscription, SubscriptionError};

/// Maximum events buffered per observer before the slowest one lags.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1024;
