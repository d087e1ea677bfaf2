//! Client-facing operation descriptors.
//!
//! Descriptors cross the process boundary and are decoded by clients built
//! against older protocol versions. Fields may be added, never removed or
//! repurposed: every field introduced after the first version carries
//! `#[serde(default)]`, and unknown fields are ignored on decode.

use serde::{Deserialize, Serialize};

use crate::problems::{Location, Severity};
use crate::subscription::OperationType;
use crate::types::OperationId;

/// Identity shared by every descriptor variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DescriptorIdentity {
    pub id: OperationId,
    pub name: String,
    pub display_name: String,
    #[serde(default)]
    pub parent_id: Option<OperationId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDescriptor {
    #[serde(flatten)]
    pub identity: DescriptorIdentity,
    pub task_path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildPhaseDescriptor {
    #[serde(flatten)]
    pub identity: DescriptorIdentity,
    pub build_phase: String,
    #[serde(default)]
    pub build_item_count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectConfigurationDescriptor {
    #[serde(flatten)]
    pub identity: DescriptorIdentity,
    pub project_path: String,
    pub build_path: String,
    #[serde(default)]
    pub root_dir: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkItemDescriptor {
    #[serde(flatten)]
    pub identity: DescriptorIdentity,
    pub class_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProblemDescriptor {
    #[serde(flatten)]
    pub identity: DescriptorIdentity,
    pub label: String,
    #[serde(default)]
    pub details: Option<String>,
    #[serde(default)]
    pub severity: Severity,
    #[serde(default)]
    pub locations: Vec<Location>,
}

/// The external representation of one build operation.
///
/// Immutable once built; the dispatcher shares it between the started and
/// finished events of the same operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OperationDescriptor {
    Task(TaskDescriptor),
    BuildPhase(BuildPhaseDescriptor),
    ProjectConfiguration(ProjectConfigurationDescriptor),
    WorkItem(WorkItemDescriptor),
    Problem(ProblemDescriptor),
}

impl OperationDescriptor {
    pub fn identity(&self) -> &DescriptorIdentity {
        match self {
            Self::Task(d) => &d.identity,
            Self::BuildPhase(d) => &d.identity,
            Self::ProjectConfiguration(d) => &d.identity,
            Self::WorkItem(d) => &d.identity,
            Self::Problem(d) => &d.identity,
        }
    }

    fn identity_mut(&mut self) -> &mut DescriptorIdentity {
        match self {
            Self::Task(d) => &mut d.identity,
            Self::BuildPhase(d) => &mut d.identity,
            Self::ProjectConfiguration(d) => &mut d.identity,
            Self::WorkItem(d) => &mut d.identity,
            Self::Problem(d) => &mut d.identity,
        }
    }

    /// Copy of this descriptor pointing at a different parent.
    pub fn with_parent_id(&self, parent_id: Option<OperationId>) -> Self {
        let mut descriptor = self.clone();
        descriptor.identity_mut().parent_id = parent_id;
        descriptor
    }

    pub fn id(&self) -> OperationId {
        self.identity().id
    }

    pub fn parent_id(&self) -> Option<OperationId> {
        self.identity().parent_id
    }

    pub fn name(&self) -> &str {
        &self.identity().name
    }

    pub fn display_name(&self) -> &str {
        &self.identity().display_name
    }

    /// The subscription tag a client must request to receive this descriptor.
    pub fn operation_type(&self) -> OperationType {
        match self {
            Self::Task(_) => OperationType::Task,
            Self::BuildPhase(_) => OperationType::BuildPhase,
            Self::ProjectConfiguration(_) => OperationType::ProjectConfiguration,
            Self::WorkItem(_) => OperationType::WorkItem,
            Self::Problem(_) => OperationType::Problems,
        }
    }
}
