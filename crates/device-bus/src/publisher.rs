//! # Event Publisher

use crate::events::{DeviceEvent, EventFilter};
use crate::subscriber::{EventStream, Subscription};
use crate::DEFAULT_CHANNEL_CAPACITY;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::broadcast;
use tracing::{debug, trace};

/// Trait for publishing change events.
///
/// Publishing is synchronous and must never block: it is called while the
/// state controller holds its transition lock, possibly from a route worker
/// thread.
pub trait EventPublisher: Send + Sync {
    /// Returns the number of observers reached; zero means dropped.
    fn publish(&self, event: DeviceEvent) -> usize;

    /// Events published, delivered or not.
    fn events_published(&self) -> u64;

    /// Events that reached no observer.
    fn events_dropped(&self) -> u64;
}

/// Broadcast channel shared by every observer of one device.
///
/// Each subscriber gets every event published after it subscribed, in publish
/// order. One that falls more than `capacity` events behind loses the oldest.
pub struct InMemoryEventBus {
    sender: broadcast::Sender<DeviceEvent>,
    capacity: usize,
    published: AtomicU64,
    dropped: AtomicU64,
}

impl InMemoryEventBus {
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            capacity,
            published: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
        }
    }

    /// Only events published after this call are delivered.
    #[must_use]
    pub fn subscribe(&self, filter: EventFilter) -> Subscription {
        debug!(topics = ?filter.topics, devices = ?filter.devices, "Observer subscribed");
        Subscription::new(self.sender.subscribe(), filter)
    }

    #[must_use]
    pub fn event_stream(&self, filter: EventFilter) -> EventStream {
        self.subscribe(filter).into_stream()
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for InMemoryEventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventPublisher for InMemoryEventBus {
    fn publish(&self, event: DeviceEvent) -> usize {
        let topic = event.topic();
        let sequence = event.sequence();
        self.published.fetch_add(1, Ordering::Relaxed);

        // send() only fails when nobody is listening.
        match self.sender.send(event) {
            Ok(receivers) => {
                trace!(topic = ?topic, sequence, receivers, "Event published");
                receivers
            }
            Err(_) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                debug!(topic = ?topic, sequence, "No observers, event dropped");
                0
            }
        }
    }

    fn events_published(&self) -> u64 {
        self.published.load(Ordering::Relaxed)
    }

    fn events_dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}
