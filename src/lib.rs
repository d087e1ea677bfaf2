//! # Build Events - Build operation progress bridge
//!
//! Translates the lifecycle of internal build operations into the progress
//! event stream seen by tooling clients:
//! - Mapper registry routing each operation details shape to one mapper
//! - Per-connection subscription filtering, evaluated before any mapping work
//! - Stable client descriptors with parent/child identity
//! - Concurrent, per-operation ordered dispatch from scheduler worker threads
//! - Problem reports with source locations
//! - Intermediate model channel for results pushed before a build finishes
//!
//! ## Architecture
//!
//! ```text
//!                      ┌──────────────────────────────────────┐
//!   worker threads  →  │       BuildEventDispatcher           │
//!   on_start/finish    │  ┌──────────┐  ┌──────────────────┐  │
//!                      │  │  Mapper  │  │ in-flight        │  │
//!                      │  │ Registry │  │ descriptors      │  │
//!                      │  └──────────┘  └──────────────────┘  │
//!                      └──────────────────┬───────────────────┘
//!                                         │ try_send
//!                      ┌──────────────────▼───────────────────┐
//!                      │  ConnectionArena (bounded queues)    │ → ProgressStream
//!                      └──────────────────────────────────────┘
//! ```

// Enforce strict safety at compile time
#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]
#![warn(rust_2018_idioms)]

// Re-export public API
pub mod bridge;
pub mod descriptor;
pub mod dispatch;
pub mod events;
pub mod intermediate;
pub mod listener;
pub mod mapper;
pub mod operation;
pub mod problems;
pub mod subscription;
pub mod types;

// Internal utilities
pub mod observability;

pub use bridge::ProgressBridge;
pub use descriptor::OperationDescriptor;
pub use dispatch::BuildEventDispatcher;
pub use events::ProgressEvent;
pub use listener::{ProgressMessage, ProgressStream};
pub use mapper::{MapperRegistry, OperationMapper};
pub use operation::{OperationFinish, OperationStart};
pub use subscription::{OperationType, SubscriptionSet};
pub use types::{Config, Error, Result};
