//! Lifecycle transition rules.
//!
//! ```text
//! | From              | Event                 | To        | Status               |
//! |-------------------|-----------------------|-----------|----------------------|
//! | UNINITIALIZED     | Initialized           | ON        | "INITIALIZED"        |
//! | UNINITIALIZED     | InitializationFailed  | FAULT     | error description    |
//! | ON/RUNNING/ALARM  | Started               | RUNNING   | "STARTED"            |
//! | ON/RUNNING/ALARM  | Stopped               | ON        | "STOPPED"            |
//! | ON/RUNNING/ALARM  | FaultReported         | ALARM     | rendered fault       |
//! | ON/RUNNING/ALARM  | CommandFailed         | ALARM     | error description    |
//! | ON/RUNNING/ALARM  | CommandRejected       | unchanged | error description    |
//! | any initialized   | TornDown              | UNINIT.   | "UNINITIALIZED"      |
//! | or FAULT          |                       |           |                      |
//! ```
//!
//! Anything not in the table is ignored.

use device_types::{DeviceState, INITIAL_STATUS};
use std::fmt;

pub const STATUS_INITIALIZED: &str = "INITIALIZED";
pub const STATUS_STARTED: &str = "STARTED";
pub const STATUS_STOPPED: &str = "STOPPED";

/// A lifecycle command exposed to the control transport.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Command {
    Init,
    Start,
    Stop,
    Shutdown,
}

impl Command {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::Start => "start",
            Self::Stop => "stop",
            Self::Shutdown => "shutdown",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Something that happened to the device.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LifecycleEvent {
    Initialized,
    InitializationFailed { reason: String },
    Started,
    Stopped,
    FaultReported { description: String },
    /// The engine failed a command for reasons other than a precondition
    CommandFailed { command: Command, reason: String },
    /// The engine refused a command because of its current run state
    CommandRejected { command: Command, reason: String },
    TornDown,
}

/// The state and status a transition writes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transition {
    pub state: DeviceState,
    pub status: String,
}

impl Transition {
    pub fn new(state: DeviceState, status: impl Into<String>) -> Self {
        Self {
            state,
            status: status.into(),
        }
    }
}

/// Compute the transition `event` causes from `current`, if any.
pub fn next_transition(current: DeviceState, event: &LifecycleEvent) -> Option<Transition> {
    use DeviceState::*;
    use LifecycleEvent::*;

    match (current, event) {
        (Uninitialized, Initialized) => Some(Transition::new(On, STATUS_INITIALIZED)),
        (Uninitialized, InitializationFailed { reason }) => Some(Transition::new(Fault, reason)),

        (On | Running | Alarm, Started) => Some(Transition::new(Running, STATUS_STARTED)),
        (On | Running | Alarm, Stopped) => Some(Transition::new(On, STATUS_STOPPED)),

        (On | Running | Alarm, FaultReported { description }) => {
            Some(Transition::new(Alarm, description))
        }
        (On | Running | Alarm, CommandFailed { reason, .. }) => {
            Some(Transition::new(Alarm, reason))
        }
        (state @ (On | Running | Alarm), CommandRejected { reason, .. }) => {
            Some(Transition::new(state, reason))
        }

        (On | Running | Alarm | Fault, TornDown) => {
            Some(Transition::new(Uninitialized, INITIAL_STATUS))
        }

        _ => None,
    }
}
