//! Core types for the build event bridge.
//!
//! This module provides foundational types used throughout the system:
//! - **IDs**: Strongly-typed identifiers (OperationId, BuildId, ConnectionId, ListenerId)
//! - **Errors**: Application error types with thiserror derives
//! - **Config**: Configuration structures for dispatch and observability

mod config;
mod errors;
mod ids;

pub use config::{Config, DispatchConfig, ObservabilityConfig, ParentResolution};
pub use errors::{Error, Result};
pub use ids::{BuildId, ConnectionId, ListenerId, OperationId};
