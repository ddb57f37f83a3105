//! # Device State
//!
//! The lifecycle state machine's value type.
//!
//! ```text
//! [UNINITIALIZED] ──init──→ [ON] ──start──→ [RUNNING]
//!        │                   ↑ ↑               │  │
//!        │ init failed       │ └─────stop──────┘  │ fault
//!        ↓                   │                    ↓
//!     [FAULT]                └──────stop────── [ALARM]
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Status message carried before `init()` has run.
pub const INITIAL_STATUS: &str = "UNINITIALIZED";

/// Lifecycle state of the device.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeviceState {
    /// Process started, engine not built yet.
    #[default]
    Uninitialized,
    /// Routes loaded and registered, engine idle.
    On,
    /// Engine started and executing routes.
    Running,
    /// A domain fault or command failure was reported.
    Alarm,
    /// Initialization failed; only teardown leaves this state.
    Fault,
}

impl DeviceState {
    /// Get the wire name of this state.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Uninitialized => "UNINITIALIZED",
            Self::On => "ON",
            Self::Running => "RUNNING",
            Self::Alarm => "ALARM",
            Self::Fault => "FAULT",
        }
    }

    /// Whether routes have been registered with an engine in this state.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        matches!(self, Self::On | Self::Running | Self::Alarm)
    }

    /// Whether a reported domain fault may move the device to `Alarm`.
    #[must_use]
    pub fn accepts_faults(&self) -> bool {
        self.is_initialized()
    }

    /// Get all states.
    #[must_use]
    pub fn all() -> [DeviceState; 5] {
        [
            Self::Uninitialized,
            Self::On,
            Self::Running,
            Self::Alarm,
            Self::Fault,
        ]
    }
}

impl fmt::Display for DeviceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A state and the status message written with it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceSnapshot {
    /// Current lifecycle state.
    pub state: DeviceState,
    /// Reason for the current state.
    pub status: String,
    /// Number of transitions committed so far.
    pub sequence: u64,
}

impl DeviceSnapshot {
    /// Snapshot of a device that has not been initialized.
    #[must_use]
    pub fn initial() -> Self {
        Self {
            state: DeviceState::Uninitialized,
            status: INITIAL_STATUS.to_string(),
            sequence: 0,
        }
    }
}

impl Default for DeviceSnapshot {
    fn default() -> Self {
        Self::initial()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_state_is_uninitialized() {
        assert_eq!(DeviceState::default(), DeviceState::Uninitialized);
        assert_eq!(DeviceSnapshot::default().status, INITIAL_STATUS);
    }

    #[test]
    fn test_display_matches_wire_name() {
        for state in DeviceState::all() {
            assert_eq!(state.to_string(), state.as_str());
        }
    }

    #[test]
    fn test_serde_uses_wire_names() {
        let json = serde_json::to_string(&DeviceState::Alarm).unwrap();
        assert_eq!(json, "\"ALARM\"");

        let back: DeviceState = serde_json::from_str("\"RUNNING\"").unwrap();
        assert_eq!(back, DeviceState::Running);
    }

    #[test]
    fn test_fault_acceptance() {
        assert!(!DeviceState::Uninitialized.accepts_faults());
        assert!(DeviceState::On.accepts_faults());
        assert!(DeviceState::Running.accepts_faults());
        assert!(DeviceState::Alarm.accepts_faults());
        assert!(!DeviceState::Fault.accepts_faults());
    }
}
