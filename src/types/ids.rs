//! Strongly-typed identifiers.
//!
//! Build, connection and listener ids are random UUID strings minted by this
//! crate; `parse` accepts an id handed over by a client and only rejects empty
//! input. `OperationId` is the scheduler-allocated numeric key of a build operation.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::errors::{Error, Result};

/// Defines a UUID-backed id newtype with `new()`, `parse()`, `as_str()`,
/// `Default`, `Display` and serde support.
macro_rules! define_id {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new() -> Self {
                Self(uuid::Uuid::new_v4().to_string())
            }

            pub fn parse(raw: impl Into<String>) -> Result<Self> {
                let raw = raw.into();
                if raw.is_empty() {
                    return Err(Error::validation(concat!(stringify!($name), " cannot be empty")));
                }
                Ok(Self(raw))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

define_id!(BuildId);
define_id!(ConnectionId);
define_id!(ListenerId);

/// Identifier of one build operation.
///
/// Unique within a build invocation and never reused there; meaningless across
/// invocations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OperationId(u64);

impl OperationId {
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    pub const fn get(self) -> u64 {
        self.0
    }
}

impl From<u64> for OperationId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
