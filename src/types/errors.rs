//! Application error types.
//!
//! All errors use `thiserror` for automatic Error trait derivation and provide
//! clear error messages with context. Filtering outcomes (a disabled mapper, a
//! declined operation, a missing finished event) are never errors; they are
//! expressed as `Option::None` by the code that produces them.

use thiserror::Error;

/// Application result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error enum for the build event bridge.
#[derive(Error, Debug)]
pub enum Error {
    /// Setup errors detected before any build signal is processed
    /// (e.g. two mappers registered for the same details type).
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A mapper received operation metadata outside its category table.
    /// The mapper table is out of sync with the scheduler's catalog; never retried.
    #[error("build operation category {category} is not supported by {mapper}")]
    UnsupportedCategory {
        category: String,
        mapper: &'static str,
    },

    /// Invalid per-operation state transition (e.g. duplicate start for a live id).
    #[error("state transition error: {0}")]
    StateTransition(String),

    /// Validation errors on caller-supplied values.
    #[error("validation error: {0}")]
    Validation(String),

    /// Internal errors.
    #[error("internal error: {0}")]
    Internal(String),

    /// Serialization/deserialization errors.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Whether this error represents a programming or setup defect that must
    /// surface immediately instead of being tolerated at runtime.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::Configuration(_) | Error::UnsupportedCategory { .. } | Error::Internal(_)
        )
    }
}

// Convenience constructors
impl Error {
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn unsupported_category(category: impl ToString, mapper: &'static str) -> Self {
        Self::UnsupportedCategory {
            category: category.to_string(),
            mapper,
        }
    }

    pub fn state_transition(msg: impl Into<String>) -> Self {
        Self::StateTransition(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}
