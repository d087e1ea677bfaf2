//! Problem mapper. Problems are point-in-time: reported once as started and
//! never finished.

use std::sync::Arc;

use crate::descriptor::{OperationDescriptor, ProblemDescriptor};
use crate::events::ProgressEvent;
use crate::operation::{OperationFinish, OperationStart, ReportProblemDetails};
use crate::subscription::{OperationType, SubscriptionSet};
use crate::types::{OperationId, Result};

use super::{identity, OperationMapper};

#[derive(Debug, Clone, Copy, Default)]
pub struct ProblemOperationMapper;

impl OperationMapper for ProblemOperationMapper {
    type Details = ReportProblemDetails;

    fn is_enabled(&self, subscriptions: &SubscriptionSet) -> bool {
        subscriptions.is_requested(OperationType::Problems)
    }

    fn create_descriptor(
        &self,
        details: &ReportProblemDetails,
        operation: &OperationStart,
        parent: Option<OperationId>,
    ) -> Result<Option<OperationDescriptor>> {
        let problem = &details.problem;
        Ok(Some(OperationDescriptor::Problem(ProblemDescriptor {
            identity: identity(operation, parent),
            label: problem.label.clone(),
            details: problem.details.clone(),
            severity: problem.severity,
            locations: problem.locations.clone(),
        })))
    }

    fn create_finished_event(
        &self,
        _descriptor: &Arc<OperationDescriptor>,
        _details: &ReportProblemDetails,
        _operation: &OperationStart,
        _finish: &OperationFinish,
    ) -> Option<ProgressEvent> {
        None
    }
}
