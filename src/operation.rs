//! Internal build operation records, as handed over by the scheduler.
//!
//! These types are engine-internal and never reach a client. The dispatcher owns
//! an `OperationStart` from the moment it is signalled until the matching
//! `OperationFinish` has been translated.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::problems::ProblemReport;
use crate::types::OperationId;

/// Coarse classification the scheduler attaches to an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BuildOperationCategory {
    ConfigureRootBuild,
    ConfigureBuild,
    ConfigureProject,
    RunMainTasks,
    RunWork,
    Task,
    Transform,
    Uncategorized,
}

impl BuildOperationCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ConfigureRootBuild => "CONFIGURE_ROOT_BUILD",
            Self::ConfigureBuild => "CONFIGURE_BUILD",
            Self::ConfigureProject => "CONFIGURE_PROJECT",
            Self::RunMainTasks => "RUN_MAIN_TASKS",
            Self::RunWork => "RUN_WORK",
            Self::Task => "TASK",
            Self::Transform => "TRANSFORM",
            Self::Uncategorized => "UNCATEGORIZED",
        }
    }
}

impl fmt::Display for BuildOperationCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metadata attached to an operation. Not every operation carries a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OperationMetadata {
    #[default]
    None,
    Category(BuildOperationCategory),
}

impl OperationMetadata {
    pub fn category(self) -> Option<BuildOperationCategory> {
        match self {
            Self::Category(category) => Some(category),
            Self::None => None,
        }
    }
}

impl From<BuildOperationCategory> for OperationMetadata {
    fn from(category: BuildOperationCategory) -> Self {
        Self::Category(category)
    }
}

/// Discriminant of `OperationDetails`; the registry routes on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetailsKind {
    RunBuildWork,
    ExecuteTask,
    ConfigureProject,
    ExecuteWorkItem,
    ReportProblem,
}

impl fmt::Display for DetailsKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::RunBuildWork => "RunBuildWork",
            Self::ExecuteTask => "ExecuteTask",
            Self::ConfigureProject => "ConfigureProject",
            Self::ExecuteWorkItem => "ExecuteWorkItem",
            Self::ReportProblem => "ReportProblem",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunBuildWorkDetails {
    pub build_path: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecuteTaskDetails {
    pub task_path: String,
    pub build_path: String,
    pub task_class: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigureProjectDetails {
    pub project_path: String,
    pub build_path: String,
    pub root_dir: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecuteWorkItemDetails {
    pub class_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportProblemDetails {
    pub problem: ProblemReport,
}

/// Typed payload of a build operation; one variant per operation kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationDetails {
    RunBuildWork(RunBuildWorkDetails),
    ExecuteTask(ExecuteTaskDetails),
    ConfigureProject(ConfigureProjectDetails),
    ExecuteWorkItem(ExecuteWorkItemDetails),
    ReportProblem(ReportProblemDetails),
}

impl OperationDetails {
    pub fn kind(&self) -> DetailsKind {
        match self {
            Self::RunBuildWork(_) => DetailsKind::RunBuildWork,
            Self::ExecuteTask(_) => DetailsKind::ExecuteTask,
            Self::ConfigureProject(_) => DetailsKind::ConfigureProject,
            Self::ExecuteWorkItem(_) => DetailsKind::ExecuteWorkItem,
            Self::ReportProblem(_) => DetailsKind::ReportProblem,
        }
    }

    fn default_name(&self) -> String {
        match self {
            Self::RunBuildWork(d) => format!("Run build {}", d.build_path),
            Self::ExecuteTask(d) => d.task_path.clone(),
            Self::ConfigureProject(d) => format!("Configure project {}", d.project_path),
            Self::ExecuteWorkItem(d) => d.class_name.clone(),
            Self::ReportProblem(d) => d.problem.label.clone(),
        }
    }
}

/// A concrete details shape that a mapper can be written against.
pub trait Details: fmt::Debug + Send + Sync + 'static {
    const KIND: DetailsKind;

    /// Borrow this shape out of the erased payload, if it matches.
    fn from_details(details: &OperationDetails) -> Option<&Self>;
}

macro_rules! impl_details {
    ($ty:ty, $variant:ident) => {
        impl Details for $ty {
            const KIND: DetailsKind = DetailsKind::$variant;

            fn from_details(details: &OperationDetails) -> Option<&Self> {
                match details {
                    OperationDetails::$variant(inner) => Some(inner),
                    _ => None,
                }
            }
        }

        impl From<$ty> for OperationDetails {
            fn from(details: $ty) -> Self {
                OperationDetails::$variant(details)
            }
        }
    };
}

impl_details!(RunBuildWorkDetails, RunBuildWork);
impl_details!(ExecuteTaskDetails, ExecuteTask);
impl_details!(ConfigureProjectDetails, ConfigureProject);
impl_details!(ExecuteWorkItemDetails, ExecuteWorkItem);
impl_details!(ReportProblemDetails, ReportProblem);

/// Start signal for one build operation.
#[derive(Debug, Clone)]
pub struct OperationStart {
    pub id: OperationId,
    pub parent_id: Option<OperationId>,
    pub name: String,
    pub display_name: String,
    pub metadata: OperationMetadata,
    /// Number of work items the operation expects to process, if known.
    pub total_progress: u32,
    pub details: OperationDetails,
    pub start_time: DateTime<Utc>,
}

impl OperationStart {
    pub fn new(
        id: OperationId,
        parent_id: Option<OperationId>,
        metadata: impl Into<OperationMetadata>,
        details: impl Into<OperationDetails>,
        start_time: DateTime<Utc>,
    ) -> Self {
        let details = details.into();
        let name = details.default_name();
        Self {
            id,
            parent_id,
            display_name: name.clone(),
            name,
            metadata: metadata.into(),
            total_progress: 0,
            details,
            start_time,
        }
    }

    pub fn named(mut self, name: impl Into<String>, display_name: impl Into<String>) -> Self {
        self.name = name.into();
        self.display_name = display_name.into();
        self
    }

    pub fn with_total_progress(mut self, total_progress: u32) -> Self {
        self.total_progress = total_progress;
        self
    }
}

/// How an operation ended.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum OperationOutcome {
    #[default]
    Success,
    UpToDate,
    FromCache,
    Skipped { reason: String },
    Failed { message: String },
}

/// Finish signal for one build operation.
#[derive(Debug, Clone)]
pub struct OperationFinish {
    pub id: OperationId,
    pub end_time: DateTime<Utc>,
    pub outcome: OperationOutcome,
}

impl OperationFinish {
    pub fn new(id: OperationId, end_time: DateTime<Utc>, outcome: OperationOutcome) -> Self {
        Self {
            id,
            end_time,
            outcome,
        }
    }
}
