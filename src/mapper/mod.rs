//! Mapper registry: one mapper per internal details shape.
//!
//! A mapper turns an internal operation into a client descriptor and progress
//! events, and decides from a connection's subscriptions whether it runs at all.
//!
//! Outcomes of `create_descriptor`:
//!   Ok(Some(descriptor)) → publish
//!   Ok(None)             → suppress silently (normal filtering)
//!   Err(..)              → mapper table out of sync with the scheduler; fatal

mod build_phase;
mod problem;
mod project;
mod task;
mod work_item;

pub use build_phase::BuildPhaseOperationMapper;
pub use problem::ProblemOperationMapper;
pub use project::ProjectConfigurationOperationMapper;
pub use task::TaskOperationMapper;
pub use work_item::WorkItemOperationMapper;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::descriptor::{DescriptorIdentity, OperationDescriptor};
use crate::events::{OperationResult, ProgressEvent};
use crate::operation::{Details, DetailsKind, OperationFinish, OperationStart};
use crate::subscription::SubscriptionSet;
use crate::types::{Error, OperationId, Result};

/// Translates one internal details shape into descriptors and events.
pub trait OperationMapper: Send + Sync + 'static {
    type Details: Details;

    /// Pure predicate over a connection's subscriptions. When false, no other
    /// method of this mapper is called for that connection.
    fn is_enabled(&self, subscriptions: &SubscriptionSet) -> bool;

    fn details_kind(&self) -> DetailsKind {
        <Self::Details as Details>::KIND
    }

    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
            .rsplit("::")
            .next()
            .unwrap_or("OperationMapper")
    }

    fn create_descriptor(
        &self,
        details: &Self::Details,
        operation: &OperationStart,
        parent: Option<OperationId>,
    ) -> Result<Option<OperationDescriptor>>;

    fn create_started_event(
        &self,
        descriptor: &Arc<OperationDescriptor>,
        _details: &Self::Details,
        operation: &OperationStart,
    ) -> ProgressEvent {
        ProgressEvent::started(operation.start_time, Arc::clone(descriptor))
    }

    /// `None` is valid for point-in-time operations that are only ever reported
    /// as started.
    fn create_finished_event(
        &self,
        descriptor: &Arc<OperationDescriptor>,
        _details: &Self::Details,
        operation: &OperationStart,
        finish: &OperationFinish,
    ) -> Option<ProgressEvent> {
        Some(ProgressEvent::finished(
            finish.end_time,
            Arc::clone(descriptor),
            OperationResult::from_outcome(operation.start_time, finish.end_time, &finish.outcome),
        ))
    }
}

/// Common identity fields, built the same way by every mapper.
pub(crate) fn identity(operation: &OperationStart, parent: Option<OperationId>) -> DescriptorIdentity {
    DescriptorIdentity {
        id: operation.id,
        name: operation.name.clone(),
        display_name: operation.display_name.clone(),
        parent_id: parent,
    }
}

/// Object-safe view of an `OperationMapper`, working on erased details.
pub(crate) trait ErasedMapper: Send + Sync {
    fn name(&self) -> &'static str;
    fn details_kind(&self) -> DetailsKind;
    fn is_enabled(&self, subscriptions: &SubscriptionSet) -> bool;
    fn create_descriptor(
        &self,
        operation: &OperationStart,
        parent: Option<OperationId>,
    ) -> Result<Option<OperationDescriptor>>;
    fn create_started_event(
        &self,
        descriptor: &Arc<OperationDescriptor>,
        operation: &OperationStart,
    ) -> Result<ProgressEvent>;
    fn create_finished_event(
        &self,
        descriptor: &Arc<OperationDescriptor>,
        operation: &OperationStart,
        finish: &OperationFinish,
    ) -> Result<Option<ProgressEvent>>;
}

fn downcast<'a, M: OperationMapper>(mapper: &M, operation: &'a OperationStart) -> Result<&'a M::Details> {
    <M::Details as Details>::from_details(&operation.details).ok_or_else(|| {
        Error::internal(format!(
            "{} was routed {} details for operation {}",
            OperationMapper::name(mapper),
            operation.details.kind(),
            operation.id
        ))
    })
}

impl<M: OperationMapper> ErasedMapper for M {
    fn name(&self) -> &'static str {
        OperationMapper::name(self)
    }

    fn details_kind(&self) -> DetailsKind {
        OperationMapper::details_kind(self)
    }

    fn is_enabled(&self, subscriptions: &SubscriptionSet) -> bool {
        OperationMapper::is_enabled(self, subscriptions)
    }

    fn create_descriptor(
        &self,
        operation: &OperationStart,
        parent: Option<OperationId>,
    ) -> Result<Option<OperationDescriptor>> {
        let details = downcast(self, operation)?;
        OperationMapper::create_descriptor(self, details, operation, parent)
    }

    fn create_started_event(
        &self,
        descriptor: &Arc<OperationDescriptor>,
        operation: &OperationStart,
    ) -> Result<ProgressEvent> {
        let details = downcast(self, operation)?;
        Ok(OperationMapper::create_started_event(
            self, descriptor, details, operation,
        ))
    }

    fn create_finished_event(
        &self,
        descriptor: &Arc<OperationDescriptor>,
        operation: &OperationStart,
        finish: &OperationFinish,
    ) -> Result<Option<ProgressEvent>> {
        let details = downcast(self, operation)?;
        Ok(OperationMapper::create_finished_event(
            self, descriptor, details, operation, finish,
        ))
    }
}

/// Read-only routing table from details kind to mapper.
pub struct MapperRegistry {
    mappers: HashMap<DetailsKind, Arc<dyn ErasedMapper>>,
}

impl MapperRegistry {
    pub fn builder() -> MapperRegistryBuilder {
        MapperRegistryBuilder::default()
    }

    /// Registry with every built-in mapper.
    pub fn with_default_mappers() -> Result<Self> {
        Self::builder()
            .register(BuildPhaseOperationMapper)
            .register(TaskOperationMapper)
            .register(ProjectConfigurationOperationMapper)
            .register(WorkItemOperationMapper)
            .register(ProblemOperationMapper)
            .build()
    }

    pub(crate) fn lookup(&self, kind: DetailsKind) -> Option<&Arc<dyn ErasedMapper>> {
        self.mappers.get(&kind)
    }

    pub fn contains(&self, kind: DetailsKind) -> bool {
        self.mappers.contains_key(&kind)
    }

    pub fn len(&self) -> usize {
        self.mappers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappers.is_empty()
    }
}

impl fmt::Debug for MapperRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.mappers.iter().map(|(kind, mapper)| (kind, mapper.name())))
            .finish()
    }
}

/// Collects mappers; duplicates are only rejected at `build()` so every
/// conflict is reported together.
#[derive(Default)]
pub struct MapperRegistryBuilder {
    mappers: Vec<Arc<dyn ErasedMapper>>,
}

impl MapperRegistryBuilder {
    pub fn register<M: OperationMapper>(mut self, mapper: M) -> Self {
        self.mappers.push(Arc::new(mapper));
        self
    }

    /// Fails fast when two mappers claim the same details kind.
    pub fn build(self) -> Result<MapperRegistry> {
        let mut mappers: HashMap<DetailsKind, Arc<dyn ErasedMapper>> = HashMap::new();
        let mut conflicts = Vec::new();

        for mapper in self.mappers {
            let kind = mapper.details_kind();
            if let Some(existing) = mappers.get(&kind) {
                conflicts.push(format!(
                    "{} details claimed by both {} and {}",
                    kind,
                    existing.name(),
                    mapper.name()
                ));
                continue;
            }
            mappers.insert(kind, mapper);
        }

        if !conflicts.is_empty() {
            let message = conflicts.join("; ");
            tracing::error!(conflicts = %message, "Duplicate operation mapper registration");
            return Err(Error::configuration(message));
        }

        tracing::debug!("Operation mapper registry built with {} mappers", mappers.len());
        Ok(MapperRegistry { mappers })
    }
}

impl fmt::Debug for MapperRegistryBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.mappers.iter().map(|mapper| mapper.name()))
            .finish()
    }
}
