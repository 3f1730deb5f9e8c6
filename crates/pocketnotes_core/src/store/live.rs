//! Change feed and live queries.
//!
//! Every successful store mutation is broadcast as a `DocumentChange`. A
//! `LiveQuery` listens to that feed and reports whether a change touched its
//! result set; the caller then re-runs its query to obtain a fresh list.
//!
//! # Invariants
//! - A change is relevant when the query matched the document before or
//!   after the write.
//! - A lagged receiver always reports a change, since events were dropped.

use log::{debug, warn};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};

use super::document::{DocumentFields, DocumentId};
use super::query::Query;

/// Default number of undelivered events a live query may fall behind.
pub const DEFAULT_FEED_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Added,
    Modified,
    Removed,
}

/// One committed write.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentChange {
    pub collection: String,
    pub id: DocumentId,
    pub kind: ChangeKind,
    /// Body before the write; `None` for inserts.
    pub before: Option<DocumentFields>,
    /// Body after the write; `None` for deletes.
    pub after: Option<DocumentFields>,
}

/// Cloneable publisher shared by every store handle on one database.
#[derive(Debug, Clone)]
pub struct ChangeFeed {
    sender: broadcast::Sender<DocumentChange>,
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::new(DEFAULT_FEED_CAPACITY)
    }
}

impl ChangeFeed {
    /// Creates a feed; `capacity` is clamped to at least one event.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publishes a change. Having no listeners is not an error.
    pub fn publish(&self, change: DocumentChange) {
        let listeners = self.sender.send(change).unwrap_or(0);
        debug!("event=change_publish module=store status=ok listeners={listeners}");
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DocumentChange> {
        self.sender.subscribe()
    }

    pub fn listener_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

/// Push-based view over one collection query.
#[derive(Debug)]
pub struct LiveQuery {
    collection: String,
    query: Query,
    receiver: broadcast::Receiver<DocumentChange>,
}

impl LiveQuery {
    pub(crate) fn new(
        collection: impl Into<String>,
        query: Query,
        receiver: broadcast::Receiver<DocumentChange>,
    ) -> Self {
        Self {
            collection: collection.into(),
            query,
            receiver,
        }
    }

    /// Drains pending events without blocking.
    ///
    /// Returns `true` when at least one drained event (or a lag) affects the
    /// result set.
    pub fn poll_changed(&mut self) -> bool {
        let mut changed = false;
        loop {
            match self.receiver.try_recv() {
                Ok(change) => changed |= self.is_relevant(&change),
                Err(TryRecvError::Lagged(skipped)) => {
                    warn!(
                        "event=live_query_lagged module=store status=degraded collection={} skipped={}",
                        self.collection, skipped
                    );
                    changed = true;
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return changed,
            }
        }
    }

    /// Waits for the next relevant change.
    ///
    /// Returns `false` once every publisher is gone.
    pub async fn changed(&mut self) -> bool {
        loop {
            match self.receiver.recv().await {
                Ok(change) if self.is_relevant(&change) => return true,
                Ok(_) => continue,
                Err(RecvError::Lagged(_)) => return true,
                Err(RecvError::Closed) => return false,
            }
        }
    }

    fn is_relevant(&self, change: &DocumentChange) -> bool {
        if change.collection != self.collection {
            return false;
        }
        let matched = |body: &Option<DocumentFields>| {
            body.as_ref().is_some_and(|fields| self.query.matches(fields))
        };
        matched(&change.before) || matched(&change.after)
    }
}
