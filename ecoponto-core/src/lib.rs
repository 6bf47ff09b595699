//! Core types and service wiring for finding waste collection points.

/// Bundle of ports backing the points screen.
pub mod backend;
/// Point discovery coordinator: loaders, reducer, and snapshot.
pub mod discovery;
/// Domain models and identifiers shared by all providers.
pub mod model;
/// Traits describing the external collaborators.
pub mod ports;
/// High-level service facade used by clients.
pub mod service;

pub use backend::*;
pub use model::*;
pub use ports::*;
pub use service::*;
