//! Progress bridge: the long-lived entry point of the crate.
//!
//! Owns the mapper registry, the connection arena and the intermediate model
//! channel. Each build gets its own `BuildEventDispatcher`.

use std::sync::Arc;

use crate::dispatch::BuildEventDispatcher;
use crate::intermediate::IntermediateModelChannel;
use crate::listener::{ConnectionArena, ProgressStream};
use crate::mapper::MapperRegistry;
use crate::subscription::SubscriptionSet;
use crate::types::{Config, ConnectionId, ParentResolution, Result};

#[derive(Debug)]
pub struct ProgressBridge {
    registry: Arc<MapperRegistry>,
    connections: Arc<ConnectionArena>,
    intermediate_models: IntermediateModelChannel,
    parent_resolution: ParentResolution,
}

impl ProgressBridge {
    pub fn new(config: &Config, registry: MapperRegistry) -> Result<Self> {
        config.validate()?;
        tracing::info!(
            mappers = registry.len(),
            queue_capacity = config.dispatch.listener_queue_capacity,
            parent_resolution = ?config.dispatch.parent_resolution,
            "Progress bridge initialized"
        );
        Ok(Self {
            registry: Arc::new(registry),
            connections: Arc::new(ConnectionArena::new(config.dispatch.listener_queue_capacity)),
            intermediate_models: IntermediateModelChannel::new(),
            parent_resolution: config.dispatch.parent_resolution,
        })
    }

    /// Default configuration with every built-in mapper.
    pub fn with_defaults() -> Result<Self> {
        Self::new(&Config::default(), MapperRegistry::with_default_mappers()?)
    }

    /// Attach a client. It receives events of builds begun after this call.
    pub fn connect(&self, subscriptions: SubscriptionSet) -> ProgressStream {
        self.connections.connect(subscriptions)
    }

    pub fn disconnect(&self, id: &ConnectionId) -> bool {
        self.connections.disconnect(id)
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    pub fn begin_build(&self) -> BuildEventDispatcher {
        BuildEventDispatcher::new(
            Arc::clone(&self.registry),
            Arc::clone(&self.connections),
            self.parent_resolution,
        )
    }

    pub fn intermediate_models(&self) -> &IntermediateModelChannel {
        &self.intermediate_models
    }

    pub fn registry(&self) -> &MapperRegistry {
        &self.registry
    }
}
