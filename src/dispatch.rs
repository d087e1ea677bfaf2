//! Build event dispatch: scheduler lifecycle signals → ordered client events.
//!
//! One `BuildEventDispatcher` exists per build invocation and is called
//! concurrently from every worker thread of that build. Per operation id:
//!
//! ```text
//! NONE → STARTED → FINISHED
//!           ↓
//!       SUPPRESSED   (no enabled mapper, or the mapper declined)
//! ```
//!
//! Ordering is a consequence of construction, not buffering: each call
//! publishes before returning, and the scheduler only starts a child after its
//! parent's start call has returned, and only finishes a parent after all of
//! its children's finish calls have returned.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::{Arc, PoisonError, RwLock, Weak};

use crate::descriptor::OperationDescriptor;
use crate::events::ProgressEvent;
use crate::listener::{Connection, ConnectionArena, EndReason, ProgressMessage};
use crate::mapper::{ErasedMapper, MapperRegistry};
use crate::operation::{OperationFinish, OperationStart};
use crate::types::{BuildId, Error, OperationId, ParentResolution, Result};

/// Per-operation state of the dispatch state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationState {
    None,
    Started,
    Suppressed,
}

/// One descriptor variant and the audience slots it was published to.
///
/// Connections that resolve the same parent share a delivery.
struct Delivery {
    descriptor: Arc<OperationDescriptor>,
    slots: Vec<usize>,
}

/// A published operation waiting for its finish signal.
struct StartedOperation {
    mapper: Arc<dyn ErasedMapper>,
    operation: OperationStart,
    deliveries: Vec<Delivery>,
}

impl StartedOperation {
    fn reached(&self, slot: usize) -> bool {
        self.deliveries
            .iter()
            .any(|delivery| delivery.slots.contains(&slot))
    }
}

/// What one connection sees of an ancestor operation.
enum Ancestor {
    /// Published to the connection.
    Visible,
    /// Live, but never sent to the connection; carries its own parent.
    Hidden(Option<OperationId>),
    /// Finished or never started.
    Gone,
}

pub struct BuildEventDispatcher {
    build_id: BuildId,
    registry: Arc<MapperRegistry>,
    arena: Arc<ConnectionArena>,
    /// Connections live when the build began. A connection is identified by
    /// its slot in this list for the rest of the build.
    audience: Vec<Weak<Connection>>,
    parent_resolution: ParentResolution,
    started: DashMap<OperationId, StartedOperation>,
    /// Suppressed id → its parent as reported by the scheduler.
    suppressed: DashMap<OperationId, Option<OperationId>>,
    /// Signals hold the read side; ending the build takes the write side, so
    /// teardown never interleaves with a half-published signal.
    closed: RwLock<bool>,
}

impl BuildEventDispatcher {
    pub(crate) fn new(
        registry: Arc<MapperRegistry>,
        arena: Arc<ConnectionArena>,
        parent_resolution: ParentResolution,
    ) -> Self {
        let build_id = BuildId::new();
        let audience = arena.snapshot();
        tracing::debug!(build = %build_id, connections = audience.len(), "Build event dispatch started");
        Self {
            build_id,
            registry,
            arena,
            audience,
            parent_resolution,
            started: DashMap::new(),
            suppressed: DashMap::new(),
            closed: RwLock::new(false),
        }
    }

    pub fn build_id(&self) -> &BuildId {
        &self.build_id
    }

    /// Number of published operations still waiting for their finish signal.
    pub fn in_flight(&self) -> usize {
        self.started.len()
    }

    /// Whether a descriptor is held for `id`.
    pub fn is_tracked(&self, id: OperationId) -> bool {
        self.started.contains_key(&id)
    }

    pub fn state(&self, id: OperationId) -> OperationState {
        if self.started.contains_key(&id) {
            OperationState::Started
        } else if self.suppressed.contains_key(&id) {
            OperationState::Suppressed
        } else {
            OperationState::None
        }
    }

    pub fn is_closed(&self) -> bool {
        *self.closed.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Handle an operation start.
    ///
    /// Returns `Err` only for defects: a duplicate start for a live id, or a
    /// category the mapper has no entry for. Suppression is `Ok`.
    pub fn on_start(&self, operation: OperationStart) -> Result<()> {
        let closed = self.closed.read().unwrap_or_else(PoisonError::into_inner);
        if *closed {
            tracing::debug!(build = %self.build_id, operation = %operation.id, "Start after build ended, ignoring");
            return Ok(());
        }

        let id = operation.id;
        if self.started.contains_key(&id) || self.suppressed.contains_key(&id) {
            return Err(Error::state_transition(format!(
                "operation {} started twice in build {}",
                id, self.build_id
            )));
        }

        let Some(mapper) = self.registry.lookup(operation.details.kind()) else {
            tracing::trace!(operation = %id, kind = %operation.details.kind(), "No mapper registered");
            self.suppressed.insert(id, operation.parent_id);
            return Ok(());
        };

        // Targets grouped by the parent each one resolves to.
        let mut groups: Vec<(Option<OperationId>, Vec<(usize, Arc<Connection>)>)> = Vec::new();
        for (slot, connection) in self.audience.iter().enumerate() {
            let Some(connection) = connection.upgrade() else {
                continue;
            };
            if !mapper.is_enabled(connection.subscriptions()) {
                continue;
            }
            let parent = self.resolve_parent(operation.parent_id, slot);
            match groups.iter_mut().find(|(resolved, _)| *resolved == parent) {
                Some((_, targets)) => targets.push((slot, connection)),
                None => groups.push((parent, vec![(slot, connection)])),
            }
        }
        let Some(first_parent) = groups.first().map(|(parent, _)| *parent) else {
            tracing::trace!(operation = %id, mapper = mapper.name(), "Mapper disabled for every connection");
            self.suppressed.insert(id, operation.parent_id);
            return Ok(());
        };

        let descriptor = match mapper.create_descriptor(&operation, first_parent) {
            Ok(Some(descriptor)) => descriptor,
            Ok(None) => {
                tracing::trace!(operation = %id, mapper = mapper.name(), "Mapper declined operation");
                self.suppressed.insert(id, operation.parent_id);
                return Ok(());
            }
            Err(err) => {
                tracing::error!(build = %self.build_id, operation = %id, error = %err, "Operation mapping failed");
                return Err(err);
            }
        };

        let mut deliveries = Vec::with_capacity(groups.len());
        let mut outgoing = Vec::with_capacity(groups.len());
        for (parent, targets) in groups {
            let descriptor = if parent == first_parent {
                Arc::new(descriptor.clone())
            } else {
                Arc::new(descriptor.with_parent_id(parent))
            };
            let event = mapper.create_started_event(&descriptor, &operation)?;
            deliveries.push(Delivery {
                descriptor,
                slots: targets.iter().map(|(slot, _)| *slot).collect(),
            });
            outgoing.push((event, targets));
        }

        match self.started.entry(id) {
            Entry::Occupied(_) => {
                return Err(Error::state_transition(format!(
                    "operation {} started twice in build {}",
                    id, self.build_id
                )));
            }
            Entry::Vacant(vacant) => {
                vacant.insert(StartedOperation {
                    mapper: Arc::clone(mapper),
                    operation,
                    deliveries,
                });
            }
        }

        for (event, targets) in outgoing {
            for (_, connection) in &targets {
                self.publish(connection, event.clone());
            }
        }
        Ok(())
    }

    /// Handle an operation finish. Suppressed and unknown ids are a no-op.
    pub fn on_finish(&self, finish: OperationFinish) -> Result<()> {
        let closed = self.closed.read().unwrap_or_else(PoisonError::into_inner);
        if *closed {
            tracing::debug!(build = %self.build_id, operation = %finish.id, "Finish after build ended, ignoring");
            return Ok(());
        }

        if self.suppressed.remove(&finish.id).is_some() {
            return Ok(());
        }

        let Some((_, started)) = self.started.remove(&finish.id) else {
            tracing::debug!(build = %self.build_id, operation = %finish.id, "Finish for untracked operation");
            return Ok(());
        };

        for delivery in &started.deliveries {
            let Some(event) = started.mapper.create_finished_event(
                &delivery.descriptor,
                &started.operation,
                &finish,
            )?
            else {
                continue;
            };
            for connection in delivery
                .slots
                .iter()
                .filter_map(|slot| self.audience.get(*slot).and_then(Weak::upgrade))
            {
                self.publish(&connection, event.clone());
            }
        }
        Ok(())
    }

    /// End the build normally. Returns the number of operations still in flight,
    /// which are dropped without finished events.
    pub fn complete(&self) -> usize {
        self.close(EndReason::Completed)
    }

    /// Abort the build: drop in-flight descriptors and send end-of-stream.
    pub fn cancel(&self) -> usize {
        self.close(EndReason::Cancelled)
    }

    fn close(&self, reason: EndReason) -> usize {
        let mut closed = self.closed.write().unwrap_or_else(PoisonError::into_inner);
        if *closed {
            return 0;
        }
        *closed = true;

        let orphaned = self.started.len();
        self.started.clear();
        self.suppressed.clear();

        for connection in self.audience.iter().filter_map(Weak::upgrade) {
            self.arena.deliver(
                &connection,
                ProgressMessage::EndOfStream {
                    build_id: self.build_id.clone(),
                    reason,
                },
            );
        }

        if orphaned > 0 {
            tracing::info!(build = %self.build_id, ?reason, orphaned, "Build ended with operations in flight");
        } else {
            tracing::debug!(build = %self.build_id, ?reason, "Build ended");
        }
        orphaned
    }

    fn ancestor(&self, id: OperationId, slot: usize) -> Ancestor {
        if let Some(entry) = self.started.get(&id) {
            return if entry.reached(slot) {
                Ancestor::Visible
            } else {
                Ancestor::Hidden(entry.operation.parent_id)
            };
        }
        match self.suppressed.get(&id) {
            Some(parent) => Ancestor::Hidden(*parent),
            None => Ancestor::Gone,
        }
    }

    /// The parent one connection should see: the nearest live ancestor that
    /// was published to it, or only the immediate parent under `Omit`.
    fn resolve_parent(&self, parent_id: Option<OperationId>, slot: usize) -> Option<OperationId> {
        let mut candidate = parent_id;
        while let Some(id) = candidate {
            match self.ancestor(id, slot) {
                Ancestor::Visible => return Some(id),
                Ancestor::Hidden(next) => match self.parent_resolution {
                    ParentResolution::NearestEnabledAncestor => candidate = next,
                    ParentResolution::Omit => return None,
                },
                Ancestor::Gone => return None,
            }
        }
        None
    }

    fn publish(&self, connection: &Connection, event: ProgressEvent) {
        self.arena.deliver(
            connection,
            ProgressMessage::Event {
                build_id: self.build_id.clone(),
                event,
            },
        );
    }
}

impl Drop for BuildEventDispatcher {
    fn drop(&mut self) {
        if !self.is_closed() {
            self.cancel();
        }
    }
}

impl std::fmt::Debug for BuildEventDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuildEventDispatcher")
            .field("build_id", &self.build_id)
            .field("audience", &self.audience.len())
            .field("in_flight", &self.started.len())
            .field("suppressed", &self.suppressed.len())
            .finish()
    }
}
