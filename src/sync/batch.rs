//! sync::batch
//!
//! Batch reconciliation through `POST /sync/{collection}`.
//!
//! The server replays the operations sequentially, resolving temporary ids
//! itself, and answers with per-operation results plus the
//! temporary-to-real id mappings it assigned:
//!
//! ```json
//! {"results": [{"index": 0, "kind": "create", "ok": true, "id": 10, "tempId": -1}],
//!  "mappings": {"-1": 10}}
//! ```
//!
//! Operations reported `ok` are dropped. Everything else, including
//! operations the response does not mention, stays queued in order. If the
//! request fails or the response is unreadable nothing changes.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::reconciler::{DrainReport, Reconciler};
use crate::api::{decode_body, encode_body, ApiError};
use crate::model::Resource;
use crate::offline::PendingOp;

#[derive(Debug, Serialize)]
struct BatchRequest {
    operations: Vec<Value>,
    sequential: bool,
    #[serde(rename = "continueOnError")]
    continue_on_error: bool,
}

#[derive(Debug, Deserialize)]
struct BatchResponse {
    #[serde(default)]
    results: Vec<BatchResult>,
    #[serde(default)]
    mappings: HashMap<String, i64>,
}

#[derive(Debug, Deserialize)]
struct BatchResult {
    #[serde(default)]
    index: Option<usize>,
    #[serde(default)]
    ok: bool,
    #[serde(default)]
    id: Option<i64>,
    #[serde(default, rename = "tempId")]
    temp_id: Option<i64>,
    #[serde(default)]
    error: Option<Value>,
}

fn batch_operation<R: Resource>(op: &PendingOp<R>) -> Result<Value, ApiError> {
    Ok(match op {
        PendingOp::Create { temp_id, payload } => json!({
            "kind": "create",
            "tempId": temp_id,
            "data": encode_body(payload)?,
        }),
        PendingOp::Update { target_id, payload } => json!({
            "kind": "update",
            "targetId": target_id,
            "data": encode_body(payload)?,
        }),
    })
}

impl<R: Resource> Reconciler<R> {
    /// Batch endpoint path for this resource (`/sync/metas`).
    pub fn batch_path() -> String {
        format!("/sync{}", R::COLLECTION)
    }

    /// Submit the whole queue in one request.
    pub async fn drain_batch(&self) -> DrainReport {
        let _guard = self.writer.lock().await;

        let ops = self.queue.get_queue().await;
        if ops.is_empty() {
            return DrainReport::default();
        }

        let response = match self.submit_batch(&ops).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(entity = R::ENTITY, pending = ops.len(), code = %e.code(), error = %e, "batch sync failed, queue left intact");
                return DrainReport {
                    succeeded: 0,
                    failed: ops.len(),
                };
            }
        };

        let mut confirmed = vec![false; ops.len()];
        let mut remap: HashMap<i64, i64> = response
            .mappings
            .iter()
            .filter_map(|(temp, real)| temp.parse::<i64>().ok().map(|temp| (temp, *real)))
            .collect();

        for (position, result) in response.results.iter().enumerate() {
            let index = result.index.unwrap_or(position);
            let Some(slot) = confirmed.get_mut(index) else {
                tracing::warn!(entity = R::ENTITY, index, "batch result for unknown operation");
                continue;
            };
            if result.ok {
                *slot = true;
                if let (Some(temp_id), Some(id)) = (result.temp_id, result.id) {
                    remap.entry(temp_id).or_insert(id);
                }
            } else {
                tracing::debug!(entity = R::ENTITY, index, error = ?result.error, "batch operation rejected");
            }
        }

        let mut cached = self.cache.get_cached().await.unwrap_or_default();
        for record in cached.iter_mut() {
            if let Some(&real) = remap.get(&record.id()) {
                record.set_id(real);
            }
        }

        let mut report = DrainReport::default();
        let mut survivors = Vec::new();
        for (op, ok) in ops.into_iter().zip(confirmed) {
            if ok {
                report.succeeded += 1;
            } else {
                report.failed += 1;
                survivors.push(op);
            }
        }

        self.queue.set_queue(&survivors).await;
        self.cache.set_cached(&cached).await;

        tracing::info!(
            entity = R::ENTITY,
            succeeded = report.succeeded,
            failed = report.failed,
            mapped = remap.len(),
            "batch drain complete"
        );
        report
    }

    async fn submit_batch(&self, ops: &[PendingOp<R>]) -> Result<BatchResponse, ApiError> {
        let request = BatchRequest {
            operations: ops
                .iter()
                .map(batch_operation)
                .collect::<Result<_, _>>()?,
            sequential: true,
            continue_on_error: true,
        };
        let body = encode_body(&request)?;
        let response = self.http.post(&Self::batch_path(), &body).await?;
        decode_body(response)
    }
}
