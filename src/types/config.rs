//! Configuration structures.
//!
//! Every section is optional when deserializing; missing sections fall back to
//! their defaults.

use serde::{Deserialize, Serialize};

use super::{Error, Result};

/// Global bridge configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Dispatch pipeline configuration.
    #[serde(default)]
    pub dispatch: DispatchConfig,

    /// Observability configuration.
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Config {
    /// Parse a JSON document and validate it.
    pub fn from_json_str(raw: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the pipeline cannot operate with.
    pub fn validate(&self) -> Result<()> {
        if self.dispatch.listener_queue_capacity == 0 {
            return Err(Error::validation(
                "dispatch.listener_queue_capacity must be positive",
            ));
        }
        Ok(())
    }
}

/// How a descriptor refers to its parent when the immediate parent was suppressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ParentResolution {
    /// Re-parent to the closest ancestor that was published, or to no parent.
    #[default]
    NearestEnabledAncestor,
    /// Drop the parent reference entirely.
    Omit,
}

/// Dispatch pipeline configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Bounded delivery queue size per client connection. A connection that
    /// falls this far behind is torn down.
    pub listener_queue_capacity: usize,

    /// Parent reference policy for children of suppressed operations.
    #[serde(default)]
    pub parent_resolution: ParentResolution,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            listener_queue_capacity: 1024,
            parent_resolution: ParentResolution::default(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Tracing log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable JSON log formatting.
    pub json_logs: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}
