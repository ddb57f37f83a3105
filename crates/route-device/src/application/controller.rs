//! State Controller
//!
//! Sole owner of the device's state and status. Every write goes through
//! `commit` while the snapshot mutex is held, and the notifications for that
//! write are published before the mutex is released, so observers see
//! transitions in commit order and a reader never sees a state paired with
//! another transition's status.
//!
//! Notification rules per commit:
//! - state channel: only when the state actually changed
//! - status channel: always, including when the same status is re-asserted

use crate::domain::{next_transition, FaultRecord, LifecycleEvent, Transition};
use crate::metrics;
use device_bus::{DeviceEvent, EventPublisher};
use device_types::{DeviceSnapshot, DeviceState};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Serializes lifecycle transitions for one device.
pub struct StateController {
    device: String,
    snapshot: Mutex<DeviceSnapshot>,
    publisher: Arc<dyn EventPublisher>,
}

impl StateController {
    pub fn new(device: impl Into<String>, publisher: Arc<dyn EventPublisher>) -> Self {
        Self {
            device: device.into(),
            snapshot: Mutex::new(DeviceSnapshot::initial()),
            publisher,
        }
    }

    pub fn device(&self) -> &str {
        &self.device
    }

    /// State, status and sequence read under one lock.
    pub fn snapshot(&self) -> DeviceSnapshot {
        self.snapshot.lock().clone()
    }

    pub fn state(&self) -> DeviceState {
        self.snapshot.lock().state
    }

    pub fn status(&self) -> String {
        self.snapshot.lock().status.clone()
    }

    /// Apply the lifecycle rules to `event`.
    ///
    /// The only way the device's state changes: the current state is read,
    /// checked against the transition table and the result written under the
    /// same lock. Returns the committed snapshot, or `None` if the event does
    /// not apply to the current state.
    pub(crate) fn apply_transition(&self, event: LifecycleEvent) -> Option<DeviceSnapshot> {
        let (from, committed) = {
            let mut current = self.snapshot.lock();
            let from = current.state;
            let committed = next_transition(from, &event)
                .map(|transition| self.commit(&mut current, transition));
            (from, committed)
        };

        match &committed {
            Some(snapshot) => {
                metrics::record_transition(snapshot.state.as_str());
                info!(
                    device = %self.device,
                    from = %from,
                    state = %snapshot.state,
                    status = %snapshot.status,
                    sequence = snapshot.sequence,
                    "Transition committed"
                );
            }
            None => debug!(
                device = %self.device,
                state = %from,
                event = ?event,
                "Lifecycle event ignored"
            ),
        }
        committed
    }

    /// Record a domain fault caught on a route.
    ///
    /// Never blocks beyond the transition lock. Returns whether the fault
    /// moved the device to `ALARM`; faults arriving before `init()` or after
    /// an init failure are logged and ignored.
    pub fn report_fault(&self, record: FaultRecord) -> bool {
        let _entered = record.context.span("report_fault").entered();
        let route_id = record.route_id;
        let severity = record.severity;

        let committed = self.apply_transition(LifecycleEvent::FaultReported {
            description: record.description,
        });

        match committed {
            Some(snapshot) => {
                metrics::record_fault_captured();
                warn!(
                    device = %self.device,
                    route_id = %route_id,
                    severity = %severity,
                    sequence = snapshot.sequence,
                    "Domain fault raised alarm"
                );
                true
            }
            None => {
                metrics::record_fault_ignored();
                warn!(
                    device = %self.device,
                    route_id = %route_id,
                    "Domain fault ignored, device not initialized"
                );
                false
            }
        }
    }

    /// Writes and publishes under the caller's guard; nothing else may run
    /// here.
    fn commit(&self, current: &mut DeviceSnapshot, transition: Transition) -> DeviceSnapshot {
        let state_changed = current.state != transition.state;

        current.state = transition.state;
        current.status = transition.status;
        current.sequence += 1;

        if state_changed {
            self.push(DeviceEvent::StateChanged {
                device: self.device.clone(),
                state: current.state,
                sequence: current.sequence,
            });
        }
        self.push(DeviceEvent::StatusChanged {
            device: self.device.clone(),
            status: current.status.clone(),
            sequence: current.sequence,
        });

        current.clone()
    }

    fn push(&self, event: DeviceEvent) {
        let channel = match &event {
            DeviceEvent::StateChanged { .. } => "state",
            DeviceEvent::StatusChanged { .. } => "status",
        };
        if self.publisher.publish(event) == 0 {
            metrics::record_notification_dropped(channel);
        }
    }
}
