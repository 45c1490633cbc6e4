//! offline::queue
//!
//! FIFO of pending operations, persisted as one JSON array blob under
//! `R::QUEUE_KEY`.
//!
//! # Invariants
//!
//! - Stored order is append order, and append order is replay order.
//! - Reads never fail. A blob that is not a JSON array reads as empty;
//!   individual entries that fail to parse are dropped with a warning and
//!   the rest are kept in order.
//!
//! Every mutation is a whole-blob read-modify-write, so callers must hold
//! the client's writer guard.

use std::marker::PhantomData;
use std::sync::Arc;

use serde_json::Value;

use super::ops::PendingOp;
use crate::model::Resource;
use crate::store::KeyValueStore;

/// Pending operation queue for resource `R`.
#[derive(Debug)]
pub struct PendingQueue<R> {
    store: Arc<KeyValueStore>,
    _resource: PhantomData<fn() -> R>,
}

impl<R> Clone for PendingQueue<R> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            _resource: PhantomData,
        }
    }
}

impl<R: Resource> PendingQueue<R> {
    pub fn new(store: Arc<KeyValueStore>) -> Self {
        Self {
            store,
            _resource: PhantomData,
        }
    }

    /// All pending operations in replay order.
    pub async fn get_queue(&self) -> Vec<PendingOp<R>> {
        let Some(raw) = self.store.get(R::QUEUE_KEY).await else {
            return Vec::new();
        };

        let entries: Vec<Value> = match serde_json::from_str(&raw) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(key = R::QUEUE_KEY, error = %e, "pending queue unreadable, treating as empty");
                return Vec::new();
            }
        };

        entries
            .into_iter()
            .enumerate()
            .filter_map(|(index, entry)| match serde_json::from_value(entry) {
                Ok(op) => Some(op),
                Err(e) => {
                    tracing::warn!(key = R::QUEUE_KEY, index, error = %e, "dropping malformed pending operation");
                    None
                }
            })
            .collect()
    }

    /// Replace the queue wholesale.
    pub async fn set_queue(&self, ops: &[PendingOp<R>]) {
        match serde_json::to_string(ops) {
            Ok(blob) => self.store.set(R::QUEUE_KEY, &blob).await,
            Err(e) => {
                tracing::warn!(key = R::QUEUE_KEY, error = %e, "cannot encode pending queue")
            }
        }
    }

    /// Append one operation.
    pub async fn enqueue(&self, op: PendingOp<R>) {
        let mut ops = self.get_queue().await;
        tracing::debug!(entity = R::ENTITY, kind = op.kind(), id = op.record_id(), position = ops.len(), "enqueue");
        ops.push(op);
        self.set_queue(&ops).await;
    }

    /// Number of pending operations.
    pub async fn len(&self) -> usize {
        self.get_queue().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Discard every pending operation. Returns how many were dropped.
    pub async fn clear(&self) -> usize {
        let dropped = self.len().await;
        self.store.remove(R::QUEUE_KEY).await;
        dropped
    }
}
