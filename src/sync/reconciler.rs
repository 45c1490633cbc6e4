//! sync::reconciler
//!
//! Replays the pending queue against the server.
//!
//! # Drain
//!
//! One pass over the queue, strictly in stored order, attempting every
//! operation exactly once:
//!
//! - `create`: POST the stored payload. On success the cached record with
//!   the temporary id is replaced by the server record and the
//!   temporary-to-real mapping is remembered for the rest of the pass.
//! - `update`: the target id is looked up in that mapping first, so an
//!   update queued against a temporary id lands on the record its create
//!   just produced. On success the server fields are merged into the cached
//!   record.
//!
//! Failed operations survive unchanged (an update keeps its original, not
//! remapped, target) and in their relative order. Failures never stop the
//! pass. The survivors replace the queue, then the cache is written.
//!
//! The whole pass runs under the writer guard.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use crate::api::{decode_body, encode_body, ApiError, HttpClient};
use crate::model::{merge_fields, Resource};
use crate::offline::{writer_lock, LocalCache, PendingOp, PendingQueue, WriterLock};
use crate::store::KeyValueStore;

/// Outcome counts of one drain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DrainReport {
    pub succeeded: usize,
    pub failed: usize,
}

impl DrainReport {
    pub fn attempted(&self) -> usize {
        self.succeeded + self.failed
    }
}

/// Reconciliation engine for resource `R`.
pub struct Reconciler<R: Resource> {
    pub(super) http: Arc<dyn HttpClient>,
    pub(super) cache: LocalCache<R>,
    pub(super) queue: PendingQueue<R>,
    pub(super) writer: WriterLock,
}

impl<R: Resource> std::fmt::Debug for Reconciler<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reconciler")
            .field("entity", &R::ENTITY)
            .finish()
    }
}

impl<R: Resource> Reconciler<R> {
    pub fn new(http: Arc<dyn HttpClient>, store: Arc<KeyValueStore>) -> Self {
        Self {
            http,
            cache: LocalCache::new(Arc::clone(&store)),
            queue: PendingQueue::new(store),
            writer: writer_lock(),
        }
    }

    /// Share a writer guard with the services of the same store.
    pub fn with_writer(mut self, writer: WriterLock) -> Self {
        self.writer = writer;
        self
    }

    /// Replay every pending operation once.
    pub async fn drain(&self) -> DrainReport {
        let _guard = self.writer.lock().await;

        let ops = self.queue.get_queue().await;
        if ops.is_empty() {
            return DrainReport::default();
        }

        let mut cached = self.cache.get_cached().await.unwrap_or_default();
        let mut remap: HashMap<i64, i64> = HashMap::new();
        let mut survivors = Vec::new();
        let mut report = DrainReport::default();

        for (index, op) in ops.into_iter().enumerate() {
            match self.replay(&op, &mut remap, &mut cached).await {
                Ok(()) => {
                    tracing::debug!(entity = R::ENTITY, index, kind = op.kind(), id = op.record_id(), "replayed");
                    report.succeeded += 1;
                }
                Err(e) => {
                    tracing::debug!(entity = R::ENTITY, index, kind = op.kind(), id = op.record_id(), code = %e.code(), error = %e, "replay failed, keeping");
                    report.failed += 1;
                    survivors.push(op);
                }
            }
        }

        self.queue.set_queue(&survivors).await;
        self.cache.set_cached(&cached).await;

        tracing::info!(
            entity = R::ENTITY,
            succeeded = report.succeeded,
            failed = report.failed,
            "drain complete"
        );
        report
    }

    async fn replay(
        &self,
        op: &PendingOp<R>,
        remap: &mut HashMap<i64, i64>,
        cached: &mut [R],
    ) -> Result<(), ApiError> {
        match op {
            PendingOp::Create { temp_id, payload } => {
                let body = encode_body(payload)?;
                let created = self.http.post(R::COLLECTION, &body).await?;
                // The server accepted the create; an odd body must not requeue it.
                match decode_body::<R>(created) {
                    Ok(record) => {
                        remap.insert(*temp_id, record.id());
                        for slot in cached.iter_mut().filter(|r| r.id() == *temp_id) {
                            *slot = record.clone();
                        }
                    }
                    Err(e) => {
                        tracing::warn!(entity = R::ENTITY, temp_id, error = %e, "create accepted but response unreadable; local record keeps its temporary id");
                    }
                }
                Ok(())
            }
            PendingOp::Update { target_id, payload } => {
                let target = remap.get(target_id).copied().unwrap_or(*target_id);
                let body = encode_body(payload)?;
                let updated = self.http.patch(&R::item_path(target), &body).await?;
                merge_into_cache(cached, target, &updated);
                Ok(())
            }
        }
    }
}

/// Overlay server fields onto the cached record with `id`.
pub(super) fn merge_into_cache<R: Resource>(cached: &mut [R], id: i64, fields: &Value) {
    for slot in cached.iter_mut().filter(|r| r.id() == id) {
        match merge_fields(slot, fields) {
            Ok(merged) => *slot = merged,
            Err(e) => {
                tracing::warn!(entity = R::ENTITY, id, error = %e, "cannot merge server fields into cached record")
            }
        }
    }
}
