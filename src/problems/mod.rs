//! Problem reports and their source locations.

pub mod location;

pub use location::Location;

use serde::{Deserialize, Serialize};

/// How serious a reported problem is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Advice,
    #[default]
    Warning,
    Error,
}

/// A problem emitted by a build operation, tagged with where it originates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProblemReport {
    pub label: String,
    #[serde(default)]
    pub details: Option<String>,
    #[serde(default)]
    pub severity: Severity,
    #[serde(default)]
    pub locations: Vec<Location>,
}

impl ProblemReport {
    pub fn new(label: impl Into<String>, severity: Severity) -> Self {
        Self {
            label: label.into(),
            details: None,
            severity,
            locations: Vec::new(),
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn at(mut self, location: Location) -> Self {
        self.locations.push(location);
        self
    }
}
