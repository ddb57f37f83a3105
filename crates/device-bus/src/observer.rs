//! # Callback Observers
//!
//! Forwards bus events to an observer object on a background task. The bus
//! only holds a `Weak` to the observer: once the owner drops it, the
//! forwarding task ends on the next event.

use crate::events::{DeviceEvent, EventFilter};
use crate::publisher::InMemoryEventBus;
use device_types::DeviceState;
use std::sync::Weak;
use tokio::task::JoinHandle;
use tracing::debug;

/// A listener for device change events.
///
/// Callbacks run on a tokio task, never on the thread that committed the
/// transition.
pub trait DeviceObserver: Send + Sync {
    /// The device entered a new state.
    fn on_state_changed(&self, device: &str, state: DeviceState, sequence: u64);

    /// The device's status message was written.
    fn on_status_changed(&self, device: &str, status: &str, sequence: u64);
}

/// Handle to a running forwarding task.
pub struct ObserverHandle {
    task: JoinHandle<()>,
}

impl ObserverHandle {
    /// Stop forwarding events.
    pub fn cancel(&self) {
        self.task.abort();
    }

    /// Whether the forwarding task has ended.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the forwarding task to end.
    pub async fn join(self) {
        let _ = self.task.await;
    }
}

/// Register a callback observer.
///
/// The subscription is taken before this function returns, so every event
/// published after the call reaches the observer. Must be called from within
/// a tokio runtime.
pub fn spawn_observer(
    bus: &InMemoryEventBus,
    observer: Weak<dyn DeviceObserver>,
    filter: EventFilter,
) -> ObserverHandle {
    let mut subscription = bus.subscribe(filter);

    let task = tokio::spawn(async move {
        while let Some(event) = subscription.recv().await {
            let Some(observer) = observer.upgrade() else {
                debug!("Observer released, stopping event forwarding");
                return;
            };

            match &event {
                DeviceEvent::StateChanged {
                    device,
                    state,
                    sequence,
                } => observer.on_state_changed(device, *state, *sequence),
                DeviceEvent::StatusChanged {
                    device,
                    status,
                    sequence,
                } => observer.on_status_changed(device, status, *sequence),
            }
        }
        debug!("Event bus closed, stopping event forwarding");
    });

    ObserverHandle { task }
}
