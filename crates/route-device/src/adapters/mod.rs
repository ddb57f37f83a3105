//! # Adapters Layer (Hexagonal Architecture)
//!
//! Implements the outbound ports: an in-memory routing engine with its
//! processor registry, and resource loaders.

mod in_memory_engine;
mod processor;
mod resource_loader;

pub use in_memory_engine::{ExchangeOutcome, InMemoryRouteEngine, DEFAULT_MAX_ACTIVE_ROUTES};
pub use processor::{Processor, ProcessorRegistry};
pub use resource_loader::{FsResourceLoader, InMemoryResourceLoader};
