//! Build phase mapper: `RunBuildWork` operations → `BuildPhase` descriptors.

use crate::descriptor::{BuildPhaseDescriptor, OperationDescriptor};
use crate::operation::{BuildOperationCategory, OperationStart, RunBuildWorkDetails};
use crate::subscription::{OperationType, SubscriptionSet};
use crate::types::{Error, OperationId, Result};

use super::{identity, OperationMapper};

#[derive(Debug, Clone, Copy, Default)]
pub struct BuildPhaseOperationMapper;

impl BuildPhaseOperationMapper {
    /// Category → external phase label. Every category is listed; adding one
    /// to the scheduler catalog does not compile until it is classified here.
    fn build_phase(category: BuildOperationCategory) -> Option<&'static str> {
        match category {
            BuildOperationCategory::ConfigureRootBuild
            | BuildOperationCategory::ConfigureBuild
            | BuildOperationCategory::ConfigureProject
            | BuildOperationCategory::RunMainTasks
            | BuildOperationCategory::RunWork => Some(category.as_str()),
            BuildOperationCategory::Task
            | BuildOperationCategory::Transform
            | BuildOperationCategory::Uncategorized => None,
        }
    }
}

impl OperationMapper for BuildPhaseOperationMapper {
    type Details = RunBuildWorkDetails;

    fn is_enabled(&self, subscriptions: &SubscriptionSet) -> bool {
        subscriptions.is_requested(OperationType::BuildPhase)
    }

    fn create_descriptor(
        &self,
        _details: &RunBuildWorkDetails,
        operation: &OperationStart,
        parent: Option<OperationId>,
    ) -> Result<Option<OperationDescriptor>> {
        let Some(category) = operation.metadata.category() else {
            return Ok(None);
        };
        let build_phase = Self::build_phase(category)
            .ok_or_else(|| Error::unsupported_category(category, OperationMapper::name(self)))?;

        Ok(Some(OperationDescriptor::BuildPhase(BuildPhaseDescriptor {
            identity: identity(operation, parent),
            build_phase: build_phase.to_string(),
            build_item_count: operation.total_progress,
        })))
    }
}
