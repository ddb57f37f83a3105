//! # Device Events
//!
//! The two change channels a device exposes to observers.

use device_types::DeviceState;
use serde::{Deserialize, Serialize};

/// A change notification published by the state controller.
///
/// `sequence` is the transition number that produced the event, so observers
/// can order events from both channels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeviceEvent {
    /// The device entered a new lifecycle state.
    StateChanged {
        /// Device that changed.
        device: String,
        /// New state.
        state: DeviceState,
        /// Transition sequence number.
        sequence: u64,
    },

    /// The device's status message was written.
    StatusChanged {
        /// Device that changed.
        device: String,
        /// New status message.
        status: String,
        /// Transition sequence number.
        sequence: u64,
    },
}

impl DeviceEvent {
    /// Get the channel this event belongs to.
    #[must_use]
    pub fn topic(&self) -> EventTopic {
        match self {
            Self::StateChanged { .. } => EventTopic::State,
            Self::StatusChanged { .. } => EventTopic::Status,
        }
    }

    /// Get the device name carried by this event.
    #[must_use]
    pub fn device(&self) -> &str {
        match self {
            Self::StateChanged { device, .. } | Self::StatusChanged { device, .. } => device,
        }
    }

    /// Get the transition sequence number.
    #[must_use]
    pub fn sequence(&self) -> u64 {
        match self {
            Self::StateChanged { sequence, .. } | Self::StatusChanged { sequence, .. } => *sequence,
        }
    }
}

/// Event channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventTopic {
    /// `StateChanged` events.
    State,
    /// `StatusChanged` events.
    Status,
    /// All events (no filtering).
    All,
}

/// Filter for subscribing to specific events.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    /// Topics to include. Empty means all topics.
    pub topics: Vec<EventTopic>,
    /// Devices to include. Empty means all devices.
    pub devices: Vec<String>,
}

impl EventFilter {
    /// Create a filter that accepts all events.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Create a filter for specific topics.
    #[must_use]
    pub fn topics(topics: Vec<EventTopic>) -> Self {
        Self {
            topics,
            devices: Vec::new(),
        }
    }

    /// Create a filter for events from a single device.
    #[must_use]
    pub fn for_device(device: impl Into<String>) -> Self {
        Self {
            topics: Vec::new(),
            devices: vec![device.into()],
        }
    }

    /// Check if an event matches this filter.
    #[must_use]
    pub fn matches(&self, event: &DeviceEvent) -> bool {
        let topic_match = self.topics.is_empty()
            || self.topics.contains(&EventTopic::All)
            || self.topics.contains(&event.topic());

        let device_match =
            self.devices.is_empty() || self.devices.iter().any(|d| d == event.device());

        topic_match && device_match
    }
}
