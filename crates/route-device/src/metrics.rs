//! Prometheus metrics for the route device.
//!
//! Enabled with the `metrics` feature; otherwise every recording function is
//! a no-op.

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;
#[cfg(feature = "metrics")]
use prometheus::{register_int_counter, register_int_counter_vec, IntCounter, IntCounterVec};

#[cfg(feature = "metrics")]
lazy_static! {
    /// Committed transitions by target state
    pub static ref TRANSITIONS: IntCounterVec = register_int_counter_vec!(
        "route_device_transitions_total",
        "Lifecycle transitions committed, by target state",
        &["state"]
    )
    .expect("Failed to create TRANSITIONS metric");

    /// Domain faults reported by the fault hook
    pub static ref FAULTS_CAPTURED: IntCounter = register_int_counter!(
        "route_device_faults_captured_total",
        "Domain faults captured on route worker threads"
    )
    .expect("Failed to create FAULTS_CAPTURED metric");

    /// Faults that arrived while the device could not accept them
    pub static ref FAULTS_IGNORED: IntCounter = register_int_counter!(
        "route_device_faults_ignored_total",
        "Domain faults ignored because the device was not initialized"
    )
    .expect("Failed to create FAULTS_IGNORED metric");

    /// Fault hook invocations that panicked
    pub static ref FAULT_HOOK_FAILURES: IntCounter = register_int_counter!(
        "route_device_fault_hook_failures_total",
        "Fault hook invocations that failed and were dropped"
    )
    .expect("Failed to create FAULT_HOOK_FAILURES metric");

    /// Notifications nobody received
    pub static ref NOTIFICATIONS_DROPPED: IntCounterVec = register_int_counter_vec!(
        "route_device_notifications_dropped_total",
        "Notifications published with no subscriber, by channel",
        &["channel"]
    )
    .expect("Failed to create NOTIFICATIONS_DROPPED metric");
}

// =============================================================================
// METRIC RECORDING FUNCTIONS
// =============================================================================

#[cfg(feature = "metrics")]
pub fn record_transition(state: &str) {
    TRANSITIONS.with_label_values(&[state]).inc();
}

#[cfg(feature = "metrics")]
pub fn record_fault_captured() {
    FAULTS_CAPTURED.inc();
}

#[cfg(feature = "metrics")]
pub fn record_fault_ignored() {
    FAULTS_IGNORED.inc();
}

#[cfg(feature = "metrics")]
pub fn record_fault_hook_failure() {
    FAULT_HOOK_FAILURES.inc();
}

#[cfg(feature = "metrics")]
pub fn record_notification_dropped(channel: &str) {
    NOTIFICATIONS_DROPPED.with_label_values(&[channel]).inc();
}

// =============================================================================
// NO-OP IMPLEMENTATIONS (when metrics feature disabled)
// =============================================================================

#[cfg(not(feature = "metrics"))]
pub fn record_transition(_state: &str) {}

#[cfg(not(feature = "metrics"))]
pub fn record_fault_captured() {}

#[cfg(not(feature = "metrics"))]
pub fn record_fault_ignored() {}

#[cfg(not(feature = "metrics"))]
pub fn record_fault_hook_failure() {}

#[cfg(not(feature = "metrics"))]
pub fn record_notification_dropped(_channel: &str) {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_never_panics() {
        record_transition("ALARM");
        record_fault_captured();
        record_fault_ignored();
        record_fault_hook_failure();
        record_notification_dropped("status");
    }
}
