//! Intermediate model channel.
//!
//! Build actions running inside the build push partial results to a client
//! listener before the build finishes. Models are delivered in push order per
//! listener. A push to a listener that was never registered, or has been torn
//! down, is a no-op.

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::types::ListenerId;

/// One pushed model, tagged with its position in the listener's sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntermediateModel {
    pub listener: ListenerId,
    pub sequence: u64,
    pub payload: serde_json::Value,
}

/// Client-side consumer of intermediate models.
pub trait IntermediateModelListener: Send {
    fn on_model(&mut self, model: serde_json::Value);
}

impl<F> IntermediateModelListener for F
where
    F: FnMut(serde_json::Value) + Send,
{
    fn on_model(&mut self, model: serde_json::Value) {
        self(model)
    }
}

#[derive(Debug)]
struct ListenerSlot {
    tx: mpsc::UnboundedSender<IntermediateModel>,
    next_sequence: u64,
}

/// Registry of listeners keyed by listener id.
#[derive(Debug, Clone, Default)]
pub struct IntermediateModelChannel {
    listeners: Arc<DashMap<ListenerId, ListenerSlot>>,
}

impl IntermediateModelChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener. A previous registration under the same id is
    /// replaced and its receiver ends.
    pub fn register(&self, listener: ListenerId) -> IntermediateModelReceiver {
        let (tx, rx) = mpsc::unbounded_channel();
        if self
            .listeners
            .insert(listener.clone(), ListenerSlot { tx, next_sequence: 0 })
            .is_some()
        {
            tracing::debug!(listener = %listener, "Intermediate model listener re-registered");
        }
        IntermediateModelReceiver { listener, rx }
    }

    /// Push a model to a listener. Returns false when nothing was delivered.
    pub fn push(&self, listener: &ListenerId, payload: serde_json::Value) -> bool {
        let Some(mut slot) = self.listeners.get_mut(listener) else {
            tracing::trace!(listener = %listener, "Push to unknown listener dropped");
            return false;
        };

        // Sequence assignment and send happen under the slot's lock.
        let model = IntermediateModel {
            listener: listener.clone(),
            sequence: slot.next_sequence,
            payload,
        };
        if slot.tx.send(model).is_err() {
            drop(slot);
            self.listeners.remove(listener);
            tracing::debug!(listener = %listener, "Intermediate model receiver dropped, removing listener");
            return false;
        }
        slot.next_sequence += 1;
        true
    }

    /// Handle bound to one listener id, for handing to a build action.
    pub fn sender(&self, listener: ListenerId) -> IntermediateModelSender {
        IntermediateModelSender {
            channel: self.clone(),
            listener,
        }
    }

    /// Remove a listener. Models already queued stay readable.
    pub fn tear_down(&self, listener: &ListenerId) -> bool {
        self.listeners.remove(listener).is_some()
    }

    pub fn is_registered(&self, listener: &ListenerId) -> bool {
        self.listeners.contains_key(listener)
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

/// Push handle for one listener. Cheap to clone across worker threads.
#[derive(Debug, Clone)]
pub struct IntermediateModelSender {
    channel: IntermediateModelChannel,
    listener: ListenerId,
}

impl IntermediateModelSender {
    pub fn listener(&self) -> &ListenerId {
        &self.listener
    }

    pub fn push(&self, payload: serde_json::Value) -> bool {
        self.channel.push(&self.listener, payload)
    }

    /// Serialize and push a typed model.
    pub fn push_model<T: Serialize>(&self, model: &T) -> crate::types::Result<bool> {
        Ok(self.push(serde_json::to_value(model)?))
    }
}

#[derive(Debug)]
pub struct IntermediateModelReceiver {
    listener: ListenerId,
    rx: mpsc::UnboundedReceiver<IntermediateModel>,
}

impl IntermediateModelReceiver {
    pub fn listener(&self) -> &ListenerId {
        &self.listener
    }

    pub async fn recv(&mut self) -> Option<IntermediateModel> {
        self.rx.recv().await
    }

    pub fn try_recv(&mut self) -> Option<IntermediateModel> {
        self.rx.try_recv().ok()
    }

    /// Feed every model to `listener` until the listener is torn down.
    /// Returns how many models were delivered.
    pub async fn forward_to<L: IntermediateModelListener>(mut self, mut listener: L) -> usize {
        let mut delivered = 0;
        while let Some(model) = self.rx.recv().await {
            listener.on_model(model.payload);
            delivered += 1;
        }
        tracing::debug!(listener = %self.listener, delivered, "Intermediate model stream ended");
        delivered
    }
}
