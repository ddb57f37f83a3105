//! Domain layer: lifecycle rules, faults and route definitions.

pub mod fault;
pub mod route;
pub mod transition;

pub use fault::{DomainFault, FaultDetail, FaultRecord, FaultSeverity};
pub use route::{Exchange, ProcessingError, RouteDefinition, RouteDefinitionSet, RouteDescriptor};
pub use transition::{
    next_transition, Command, LifecycleEvent, Transition, STATUS_INITIALIZED, STATUS_STARTED,
    STATUS_STOPPED,
};
