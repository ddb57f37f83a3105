//! Error types for the route device.
//!
//! Domain faults raised while processing an exchange are not errors in this
//! sense: they are values (`DomainFault`) handed to the fault hook and never
//! returned to a command caller.

use device_types::DeviceState;
use thiserror::Error;

/// Failure to locate or read a named resource.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ResourceError {
    /// No resource under the namespace with that name
    #[error("Resource not found: {namespace}/{filename}")]
    NotFound { namespace: String, filename: String },

    /// Resource exists but could not be read
    #[error("Failed to read resource {path}: {reason}")]
    Unreadable { path: String, reason: String },
}

/// Route definitions could not be obtained or understood.
///
/// Fatal to `init()`: the device moves to `FAULT`.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigurationError {
    /// Definition source is missing or unreadable
    #[error("Route definitions unavailable: {0}")]
    Resource(#[from] ResourceError),

    /// Definition source is not valid route TOML
    #[error("Malformed route definitions: {reason}")]
    Malformed { reason: String },

    /// Definition source parses but declares no routes
    #[error("Route definitions declare no routes")]
    NoRoutes,

    /// A single route is missing a required field
    #[error("Invalid route definition '{route_id}': {reason}")]
    InvalidRoute { route_id: String, reason: String },

    /// `init()` called again without an intervening `shutdown()`
    #[error("Device already initialized (state {state}); shutdown first")]
    AlreadyInitialized { state: DeviceState },
}

/// Failures reported by the routing engine.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EngineError {
    /// `stop()` while no route is running
    #[error("Routing engine is not running")]
    NotRunning,

    /// `start()` while already running
    #[error("Routing engine is already running")]
    AlreadyRunning,

    /// Two routes in one definition set share an id
    #[error("Duplicate route id: {route_id}")]
    DuplicateRoute { route_id: String },

    /// A route step names a processor the engine does not know
    #[error("Route '{route_id}' references unknown processor '{processor}'")]
    UnknownProcessor { route_id: String, processor: String },

    /// A definition set was already registered with this engine
    #[error("Route definitions already registered")]
    AlreadyRegistered,

    /// Engine cannot allocate what starting the routes needs
    #[error("Insufficient resources: {reason}")]
    ResourceExhausted { reason: String },

    /// Exchange addressed to a route the engine does not have
    #[error("Unknown route: {route_id}")]
    UnknownRoute { route_id: String },

    /// Exchange addressed to a route that is not active
    #[error("Route '{route_id}' is not active")]
    RouteInactive { route_id: String },

    /// Engine could not be constructed
    #[error("Failed to create routing engine: {reason}")]
    Construction { reason: String },
}

impl EngineError {
    /// Whether this is a precondition violation that leaves the device
    /// state as it was.
    pub fn is_precondition(&self) -> bool {
        matches!(self, Self::NotRunning | Self::AlreadyRunning)
    }
}

/// Errors returned by lifecycle commands.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LifecycleError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Engine(#[from] EngineError),

    /// Command needs an engine but `init()` has not succeeded
    #[error("Device not initialized (state {state})")]
    NotInitialized { state: DeviceState },
}

/// Result type for lifecycle commands
pub type LifecycleResult<T> = Result<T, LifecycleError>;
