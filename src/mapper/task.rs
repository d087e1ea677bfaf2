//! Task mapper: `ExecuteTask` operations → `Task` descriptors.

use std::sync::Arc;

use crate::descriptor::{OperationDescriptor, TaskDescriptor};
use crate::events::{OperationResult, ProgressEvent, TaskExecution};
use crate::operation::{
    BuildOperationCategory, ExecuteTaskDetails, OperationFinish, OperationOutcome, OperationStart,
};
use crate::subscription::{OperationType, SubscriptionSet};
use crate::types::{Error, OperationId, Result};

use super::{identity, OperationMapper};

#[derive(Debug, Clone, Copy, Default)]
pub struct TaskOperationMapper;

impl OperationMapper for TaskOperationMapper {
    type Details = ExecuteTaskDetails;

    fn is_enabled(&self, subscriptions: &SubscriptionSet) -> bool {
        subscriptions.is_requested(OperationType::Task)
    }

    fn create_descriptor(
        &self,
        details: &ExecuteTaskDetails,
        operation: &OperationStart,
        parent: Option<OperationId>,
    ) -> Result<Option<OperationDescriptor>> {
        // Task operations carry either no category or TASK.
        match operation.metadata.category() {
            None | Some(BuildOperationCategory::Task) => {}
            Some(
                category @ (BuildOperationCategory::ConfigureRootBuild
                | BuildOperationCategory::ConfigureBuild
                | BuildOperationCategory::ConfigureProject
                | BuildOperationCategory::RunMainTasks
                | BuildOperationCategory::RunWork
                | BuildOperationCategory::Transform
                | BuildOperationCategory::Uncategorized),
            ) => {
                return Err(Error::unsupported_category(
                    category,
                    OperationMapper::name(self),
                ))
            }
        }

        Ok(Some(OperationDescriptor::Task(TaskDescriptor {
            identity: identity(operation, parent),
            task_path: details.task_path.clone(),
        })))
    }

    fn create_finished_event(
        &self,
        descriptor: &Arc<OperationDescriptor>,
        _details: &ExecuteTaskDetails,
        operation: &OperationStart,
        finish: &OperationFinish,
    ) -> Option<ProgressEvent> {
        let task = TaskExecution {
            up_to_date: matches!(
                finish.outcome,
                OperationOutcome::UpToDate | OperationOutcome::FromCache
            ),
            from_cache: matches!(finish.outcome, OperationOutcome::FromCache),
        };
        Some(ProgressEvent::Finished {
            event_time: finish.end_time,
            descriptor: Arc::clone(descriptor),
            result: OperationResult::from_outcome(
                operation.start_time,
                finish.end_time,
                &finish.outcome,
            ),
            task: Some(task),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operation::OperationMetadata;
    use chrono::Utc;

    fn details() -> ExecuteTaskDetails {
        ExecuteTaskDetails {
            task_path: ":lib:jar".to_string(),
            build_path: ":".to_string(),
            task_class: "Jar".to_string(),
        }
    }

    fn start(metadata: OperationMetadata) -> OperationStart {
        OperationStart::new(OperationId::new(4), None, metadata, details(), Utc::now())
    }

    #[test]
    fn test_descriptor_carries_task_path() {
        let descriptor = TaskOperationMapper
            .create_descriptor(&details(), &start(BuildOperationCategory::Task.into()), None)
            .unwrap()
            .unwrap();
        match descriptor {
            OperationDescriptor::Task(task) => {
                assert_eq!(task.task_path, ":lib:jar");
                assert_eq!(task.identity.name, ":lib:jar");
            }
            other => panic!("unexpected descriptor: {other:?}"),
        }
    }

    #[test]
    fn test_uncategorized_metadata_accepted() {
        let descriptor = TaskOperationMapper
            .create_descriptor(&details(), &start(OperationMetadata::None), None)
            .unwrap();
        assert!(descriptor.is_some());
    }

    #[test]
    fn test_foreign_category_is_unsupported() {
        let err = TaskOperationMapper
            .create_descriptor(
                &details(),
                &start(BuildOperationCategory::RunWork.into()),
                None,
            )
            .unwrap_err();
        assert!(matches!(err, Error::UnsupportedCategory { .. }));
    }

    #[test]
    fn test_from_cache_reports_up_to_date() {
        let operation = start(OperationMetadata::None);
        let descriptor = Arc::new(
            TaskOperationMapper
                .create_descriptor(&details(), &operation, None)
                .unwrap()
                .unwrap(),
        );
        let finish = OperationFinish::new(operation.id, Utc::now(), OperationOutcome::FromCache);
        let event = TaskOperationMapper
            .create_finished_event(&descriptor, &details(), &operation, &finish)
            .unwrap();
        match event {
            ProgressEvent::Finished { task, result, .. } => {
                assert_eq!(
                    task,
                    Some(TaskExecution {
                        up_to_date: true,
                        from_cache: true
                    })
                );
                assert!(result.is_success());
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }
}
