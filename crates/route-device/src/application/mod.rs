//! Application layer: the components that turn engine activity into device
//! lifecycle transitions.

mod controller;
mod engine_handle;
mod interceptor;
mod service;

pub use controller::StateController;
pub use engine_handle::EngineHandle;
pub use interceptor::FaultInterceptor;
pub use service::LifecycleService;
