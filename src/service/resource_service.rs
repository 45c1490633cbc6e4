//! service::resource_service
//!
//! Network-first CRUD over one collection, with offline fallback.
//!
//! # Fallback policy
//!
//! Only network-class failures ([`ApiError::is_network_class`]) engage the
//! fallback. A response with a status code, 5xx included, is a server
//! decision and is returned to the caller with no local side effect.
//!
//! | Operation | On network-class failure |
//! |---|---|
//! | `list` | cached snapshot if present and non-empty |
//! | `get` | error |
//! | `create` | optimistic record with a temporary id, queued create |
//! | `update` | merged cached record, queued update (needs a cached base) |
//! | `delete` | error |

use std::sync::Arc;

use chrono::Utc;

use crate::api::{decode_body, encode_body, ApiError, HttpClient};
use crate::auth::SessionProvider;
use crate::model::Resource;
use crate::offline::{writer_lock, LocalCache, PendingOp, PendingQueue, WriterLock};
use crate::store::KeyValueStore;

/// Next temporary id: one below the smallest id in use, and always negative.
///
/// Stops at `i64::MIN` instead of wrapping.
pub fn next_temp_id<R: Resource>(cached: &[R], queued: &[PendingOp<R>]) -> i64 {
    let smallest = cached
        .iter()
        .map(Resource::id)
        .chain(queued.iter().map(PendingOp::record_id))
        .fold(0, i64::min);
    smallest.saturating_sub(1)
}

/// Resource service for `R`.
pub struct ResourceService<R: Resource> {
    http: Arc<dyn HttpClient>,
    session: Arc<dyn SessionProvider>,
    cache: LocalCache<R>,
    queue: PendingQueue<R>,
    writer: WriterLock,
}

impl<R: Resource> std::fmt::Debug for ResourceService<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceService")
            .field("entity", &R::ENTITY)
            .field("base_url", &self.http.base_url())
            .finish()
    }
}

impl<R: Resource> ResourceService<R> {
    /// Create a service with its own writer guard.
    pub fn new(
        http: Arc<dyn HttpClient>,
        store: Arc<KeyValueStore>,
        session: Arc<dyn SessionProvider>,
    ) -> Self {
        Self {
            http,
            session,
            cache: LocalCache::new(Arc::clone(&store)),
            queue: PendingQueue::new(store),
            writer: writer_lock(),
        }
    }

    /// Share a writer guard with other services and reconcilers.
    pub fn with_writer(mut self, writer: WriterLock) -> Self {
        self.writer = writer;
        self
    }

    pub fn cache(&self) -> &LocalCache<R> {
        &self.cache
    }

    pub fn queue(&self) -> &PendingQueue<R> {
        &self.queue
    }

    /// Fetch the collection, refreshing the cache.
    ///
    /// Offline, the cached snapshot is returned when it has at least one
    /// record; otherwise the network error propagates.
    pub async fn list(&self) -> Result<Vec<R>, ApiError> {
        let fetched = match self.http.get(R::COLLECTION).await {
            Ok(body) => decode_body::<Vec<R>>(body),
            Err(e) => Err(e),
        };

        match fetched {
            Ok(records) => {
                let _guard = self.writer.lock().await;
                self.cache.set_cached(&records).await;
                Ok(records)
            }
            Err(e) if e.is_network_class() => match self.cache.get_cached().await {
                Some(cached) if !cached.is_empty() => {
                    tracing::info!(entity = R::ENTITY, count = cached.len(), code = %e.code(), "offline, serving cached collection");
                    Ok(cached)
                }
                _ => Err(e),
            },
            Err(e) => Err(e),
        }
    }

    /// Fetch one record. No fallback.
    pub async fn get(&self, id: i64) -> Result<R, ApiError> {
        let body = self.http.get(&R::item_path(id)).await?;
        decode_body(body)
    }

    /// Create a record, or accept it locally when the server is unreachable.
    ///
    /// A missing owner is taken from the session. Offline creation with no
    /// owner and no session fails with [`ApiError::NotAuthenticated`].
    pub async fn create(&self, input: R::Create) -> Result<R, ApiError> {
        let mut payload = input;
        if R::create_owner(&payload).is_none() {
            if let Some(user_id) = self.session.user_id().await {
                R::set_create_owner(&mut payload, user_id);
            }
        }
        let body = encode_body(&payload)?;

        let _guard = self.writer.lock().await;
        match self.http.post(R::COLLECTION, &body).await {
            Ok(created) => decode_body(created),
            Err(e) if e.is_network_class() => self.create_offline(payload, &e).await,
            Err(e) => Err(e),
        }
    }

    async fn create_offline(&self, payload: R::Create, cause: &ApiError) -> Result<R, ApiError> {
        if R::create_owner(&payload).is_none() {
            return Err(ApiError::NotAuthenticated(format!(
                "cannot create {} offline without an owner or a session",
                R::ENTITY
            )));
        }

        let mut cached = self.cache.get_cached().await.unwrap_or_default();
        let mut queued = self.queue.get_queue().await;
        let temp_id = next_temp_id(&cached, &queued);

        let record = R::optimistic(temp_id, &payload, Utc::now());
        cached.insert(0, record.clone());
        self.cache.set_cached(&cached).await;

        queued.push(PendingOp::Create { temp_id, payload });
        self.queue.set_queue(&queued).await;

        tracing::info!(entity = R::ENTITY, temp_id, pending = queued.len(), code = %cause.code(), "offline create queued");
        Ok(record)
    }

    /// Update a record, or apply the change locally when the server is
    /// unreachable and the record is cached.
    pub async fn update(&self, id: i64, changes: R::Changes) -> Result<R, ApiError> {
        let body = encode_body(&changes)?;

        let _guard = self.writer.lock().await;
        match self.http.patch(&R::item_path(id), &body).await {
            Ok(updated) => decode_body(updated),
            Err(e) if e.is_network_class() => self.update_offline(id, changes, e).await,
            Err(e) => Err(e),
        }
    }

    async fn update_offline(
        &self,
        id: i64,
        changes: R::Changes,
        cause: ApiError,
    ) -> Result<R, ApiError> {
        let mut cached = self.cache.get_cached().await.unwrap_or_default();
        let Some(position) = cached.iter().position(|r| r.id() == id) else {
            tracing::debug!(entity = R::ENTITY, id, "offline update without cached base, not queued");
            return Err(cause);
        };

        cached[position].apply_changes(&changes, Utc::now());
        let merged = cached[position].clone();
        self.cache.set_cached(&cached).await;

        self.queue
            .enqueue(PendingOp::Update {
                target_id: id,
                payload: changes,
            })
            .await;

        tracing::info!(entity = R::ENTITY, id, code = %cause.code(), "offline update queued");
        Ok(merged)
    }

    /// Delete a record. Network only; deletions are never queued.
    pub async fn delete(&self, id: i64) -> Result<(), ApiError> {
        self.http.delete(&R::item_path(id)).await?;
        Ok(())
    }
}
