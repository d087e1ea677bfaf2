//! Work item mapper.

use crate::descriptor::{OperationDescriptor, WorkItemDescriptor};
use crate::operation::{ExecuteWorkItemDetails, OperationStart};
use crate::subscription::{OperationType, SubscriptionSet};
use crate::types::{OperationId, Result};

use super::{identity, OperationMapper};

#[derive(Debug, Clone, Copy, Default)]
pub struct WorkItemOperationMapper;

impl OperationMapper for WorkItemOperationMapper {
    type Details = ExecuteWorkItemDetails;

    fn is_enabled(&self, subscriptions: &SubscriptionSet) -> bool {
        subscriptions.is_requested(OperationType::WorkItem)
    }

    // Work items run under any category; metadata is not consulted.
    fn create_descriptor(
        &self,
        details: &ExecuteWorkItemDetails,
        operation: &OperationStart,
        parent: Option<OperationId>,
    ) -> Result<Option<OperationDescriptor>> {
        Ok(Some(OperationDescriptor::WorkItem(WorkItemDescriptor {
            identity: identity(operation, parent),
            class_name: details.class_name.clone(),
        })))
    }
}
