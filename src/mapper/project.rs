//! Project configuration mapper.

use crate::descriptor::{OperationDescriptor, ProjectConfigurationDescriptor};
use crate::operation::{BuildOperationCategory, ConfigureProjectDetails, OperationStart};
use crate::subscription::{OperationType, SubscriptionSet};
use crate::types::{Error, OperationId, Result};

use super::{identity, OperationMapper};

#[derive(Debug, Clone, Copy, Default)]
pub struct ProjectConfigurationOperationMapper;

impl OperationMapper for ProjectConfigurationOperationMapper {
    type Details = ConfigureProjectDetails;

    fn is_enabled(&self, subscriptions: &SubscriptionSet) -> bool {
        subscriptions.is_requested(OperationType::ProjectConfiguration)
    }

    fn create_descriptor(
        &self,
        details: &ConfigureProjectDetails,
        operation: &OperationStart,
        parent: Option<OperationId>,
    ) -> Result<Option<OperationDescriptor>> {
        match operation.metadata.category() {
            None | Some(BuildOperationCategory::ConfigureProject) => {}
            Some(
                category @ (BuildOperationCategory::ConfigureRootBuild
                | BuildOperationCategory::ConfigureBuild
                | BuildOperationCategory::RunMainTasks
                | BuildOperationCategory::RunWork
                | BuildOperationCategory::Task
                | BuildOperationCategory::Transform
                | BuildOperationCategory::Uncategorized),
            ) => {
                return Err(Error::unsupported_category(
                    category,
                    OperationMapper::name(self),
                ))
            }
        }

        Ok(Some(OperationDescriptor::ProjectConfiguration(
            ProjectConfigurationDescriptor {
                identity: identity(operation, parent),
                project_path: details.project_path.clone(),
                build_path: details.build_path.clone(),
                root_dir: Some(details.root_dir.clone()),
            },
        )))
    }
}
