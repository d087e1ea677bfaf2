//! Progress events delivered to tooling clients.
//!
//! Every event carries the descriptor of the operation it reports on. Like
//! descriptors, the event field set only ever grows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::descriptor::OperationDescriptor;
use crate::operation::OperationOutcome;

/// Result reported with a finished event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum OperationResult {
    Success {
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    },
    Skipped {
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        reason: String,
    },
    Failure {
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        message: String,
    },
}

impl OperationResult {
    pub fn from_outcome(
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        outcome: &OperationOutcome,
    ) -> Self {
        match outcome {
            OperationOutcome::Success | OperationOutcome::UpToDate | OperationOutcome::FromCache => {
                Self::Success {
                    start_time,
                    end_time,
                }
            }
            OperationOutcome::Skipped { reason } => Self::Skipped {
                start_time,
                end_time,
                reason: reason.clone(),
            },
            OperationOutcome::Failed { message } => Self::Failure {
                start_time,
                end_time,
                message: message.clone(),
            },
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// Task-specific execution facts, reported alongside the generic result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TaskExecution {
    #[serde(default)]
    pub up_to_date: bool,
    #[serde(default)]
    pub from_cache: bool,
}

/// A started or finished notification for one operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProgressEvent {
    Started {
        event_time: DateTime<Utc>,
        descriptor: Arc<OperationDescriptor>,
    },
    Finished {
        event_time: DateTime<Utc>,
        descriptor: Arc<OperationDescriptor>,
        result: OperationResult,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        task: Option<TaskExecution>,
    },
}

impl ProgressEvent {
    pub fn started(event_time: DateTime<Utc>, descriptor: Arc<OperationDescriptor>) -> Self {
        Self::Started {
            event_time,
            descriptor,
        }
    }

    pub fn finished(
        event_time: DateTime<Utc>,
        descriptor: Arc<OperationDescriptor>,
        result: OperationResult,
    ) -> Self {
        Self::Finished {
            event_time,
            descriptor,
            result,
            task: None,
        }
    }

    pub fn descriptor(&self) -> &OperationDescriptor {
        match self {
            Self::Started { descriptor, .. } | Self::Finished { descriptor, .. } => descriptor,
        }
    }

    pub fn is_started(&self) -> bool {
        matches!(self, Self::Started { .. })
    }

    pub fn event_time(&self) -> DateTime<Utc> {
        match self {
            Self::Started { event_time, .. } | Self::Finished { event_time, .. } => *event_time,
        }
    }
}
