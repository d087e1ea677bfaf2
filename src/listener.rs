//! Client connections and their delivery queues.
//!
//! Each connection owns its subscription set and a bounded queue. Dispatch
//! threads hand messages over with `try_send`, so a slow client never holds a
//! scheduler thread. A client that lets its queue fill up is torn down; its
//! stream ends after the already-queued messages and reports why.

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, OnceLock, Weak};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use crate::events::ProgressEvent;
use crate::subscription::SubscriptionSet;
use crate::types::{BuildId, ConnectionId};

/// Why a build's event stream ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    Completed,
    Cancelled,
}

/// Why a connection stopped receiving messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CloseReason {
    Disconnected,
    Overflowed,
}

/// One item of a connection's ordered stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "message", rename_all = "snake_case")]
pub enum ProgressMessage {
    Event {
        build_id: BuildId,
        event: ProgressEvent,
    },
    EndOfStream {
        build_id: BuildId,
        reason: EndReason,
    },
}

#[derive(Debug)]
pub(crate) struct Connection {
    id: ConnectionId,
    subscriptions: SubscriptionSet,
    tx: mpsc::Sender<ProgressMessage>,
    close_reason: Arc<OnceLock<CloseReason>>,
}

impl Connection {
    pub(crate) fn subscriptions(&self) -> &SubscriptionSet {
        &self.subscriptions
    }
}

/// Arena of live connections, indexed by connection id.
#[derive(Debug)]
pub struct ConnectionArena {
    connections: DashMap<ConnectionId, Arc<Connection>>,
    queue_capacity: usize,
}

impl ConnectionArena {
    pub fn new(queue_capacity: usize) -> Self {
        Self {
            connections: DashMap::new(),
            queue_capacity: queue_capacity.max(1),
        }
    }

    /// Register a client connection with its negotiated subscriptions.
    pub fn connect(&self, subscriptions: SubscriptionSet) -> ProgressStream {
        let id = ConnectionId::new();
        let (tx, rx) = mpsc::channel(self.queue_capacity);
        let close_reason = Arc::new(OnceLock::new());

        self.connections.insert(
            id.clone(),
            Arc::new(Connection {
                id: id.clone(),
                subscriptions,
                tx,
                close_reason: Arc::clone(&close_reason),
            }),
        );

        tracing::debug!(connection = %id, ?subscriptions, "Client connection registered");

        ProgressStream {
            id,
            subscriptions,
            rx,
            close_reason,
        }
    }

    /// Remove a connection. Returns false if it was already gone.
    pub fn disconnect(&self, id: &ConnectionId) -> bool {
        self.tear_down(id, CloseReason::Disconnected)
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    /// Weak handles to every connection live right now.
    pub(crate) fn snapshot(&self) -> Vec<Weak<Connection>> {
        self.connections
            .iter()
            .map(|entry| Arc::downgrade(entry.value()))
            .collect()
    }

    /// Hand a message to one connection without blocking.
    ///
    /// A closed receiver is dropped quietly. A full queue tears the connection
    /// down so the client observes a terminated stream instead of a gap.
    pub(crate) fn deliver(&self, connection: &Connection, message: ProgressMessage) -> bool {
        match connection.tx.try_send(message) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                tracing::warn!(
                    connection = %connection.id,
                    capacity = self.queue_capacity,
                    "Client delivery queue full, tearing down connection"
                );
                self.tear_down(&connection.id, CloseReason::Overflowed);
                false
            }
            Err(TrySendError::Closed(_)) => {
                tracing::debug!(connection = %connection.id, "Client stream dropped, removing connection");
                self.tear_down(&connection.id, CloseReason::Disconnected);
                false
            }
        }
    }

    fn tear_down(&self, id: &ConnectionId, reason: CloseReason) -> bool {
        match self.connections.remove(id) {
            Some((_, connection)) => {
                let _ = connection.close_reason.set(reason);
                tracing::debug!(connection = %id, ?reason, "Client connection closed");
                true
            }
            None => false,
        }
    }
}

/// Receiving end of one client connection.
///
/// Yields messages in publish order. `None` means the connection is closed and
/// fully drained; `close_reason()` then says why.
#[derive(Debug)]
pub struct ProgressStream {
    id: ConnectionId,
    subscriptions: SubscriptionSet,
    rx: mpsc::Receiver<ProgressMessage>,
    close_reason: Arc<OnceLock<CloseReason>>,
}

impl ProgressStream {
    pub fn id(&self) -> &ConnectionId {
        &self.id
    }

    pub fn subscriptions(&self) -> &SubscriptionSet {
        &self.subscriptions
    }

    pub async fn recv(&mut self) -> Option<ProgressMessage> {
        self.rx.recv().await
    }

    pub fn try_recv(&mut self) -> Option<ProgressMessage> {
        self.rx.try_recv().ok()
    }

    /// Block the current (non-async) thread until the next message.
    pub fn blocking_recv(&mut self) -> Option<ProgressMessage> {
        self.rx.blocking_recv()
    }

    /// Drain everything currently queued without waiting.
    pub fn drain(&mut self) -> Vec<ProgressMessage> {
        std::iter::from_fn(|| self.rx.try_recv().ok()).collect()
    }

    pub fn close_reason(&self) -> Option<CloseReason> {
        self.close_reason.get().copied()
    }
}
