//! store::kv
//!
//! The infallible key-value contract used by the offline cache, the pending
//! queue and the session.
//!
//! # Failure policy
//!
//! - A failed backend read returns whatever the fallback map holds for the
//!   key, which is absence unless an earlier write already fell back.
//! - A failed backend write is logged and kept in the fallback map. The value
//!   is visible for the rest of the process lifetime but will not survive a
//!   restart.
//! - A failed backend remove leaves a tombstone in the fallback map, so the
//!   stale backend value stays hidden until the next successful write.
//!
//! Durability is sacrificed, never correctness within the session.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use super::traits::StorageBackend;

/// Key-value store over an injected backend with an in-memory fallback.
pub struct KeyValueStore {
    backend: Arc<dyn StorageBackend>,
    /// `None` is a tombstone for a remove the backend refused.
    fallback: Mutex<HashMap<String, Option<String>>>,
}

impl std::fmt::Debug for KeyValueStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyValueStore")
            .field("backend", &self.backend.name())
            .finish()
    }
}

impl KeyValueStore {
    /// Wrap a backend.
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self {
            backend,
            fallback: Mutex::new(HashMap::new()),
        }
    }

    /// Name of the underlying backend.
    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Read a blob. Never fails.
    ///
    /// A value held in the fallback map is newer than anything in the
    /// backend, so it wins.
    pub async fn get(&self, key: &str) -> Option<String> {
        if let Some(entry) = self.fallback_get(key) {
            return entry;
        }
        match self.backend.get(key).await {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(key, backend = self.backend.name(), error = %e, "store read failed, treating as absent");
                None
            }
        }
    }

    /// Write a blob. Never fails.
    pub async fn set(&self, key: &str, value: &str) {
        match self.backend.set(key, value).await {
            Ok(()) => self.fallback_remove(key),
            Err(e) => {
                tracing::warn!(key, backend = self.backend.name(), error = %e, "store write failed, keeping value in memory");
                if let Ok(mut map) = self.fallback.lock() {
                    map.insert(key.to_string(), Some(value.to_string()));
                }
            }
        }
    }

    /// Remove a blob. Never fails.
    pub async fn remove(&self, key: &str) {
        match self.backend.remove(key).await {
            Ok(()) => self.fallback_remove(key),
            Err(e) => {
                tracing::warn!(key, backend = self.backend.name(), error = %e, "store remove failed, hiding key in memory");
                if let Ok(mut map) = self.fallback.lock() {
                    map.insert(key.to_string(), None);
                }
            }
        }
    }

    /// `Some(entry)` when the fallback map has an opinion about `key`.
    fn fallback_get(&self, key: &str) -> Option<Option<String>> {
        self.fallback
            .lock()
            .ok()
            .and_then(|map| map.get(key).cloned())
    }

    fn fallback_remove(&self, key: &str) {
        if let Ok(mut map) = self.fallback.lock() {
            map.remove(key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryBackend, StoreError};
    use async_trait::async_trait;

    /// Backend whose every operation fails.
    struct BrokenBackend;

    #[async_trait]
    impl StorageBackend for BrokenBackend {
        fn name(&self) -> &'static str {
            "broken"
        }

        async fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
            Err(StoreError::ReadError("unavailable".into()))
        }

        async fn set(&self, _key: &str, _value: &str) -> Result<(), StoreError> {
            Err(StoreError::WriteError("unavailable".into()))
        }

        async fn remove(&self, _key: &str) -> Result<(), StoreError> {
            Err(StoreError::WriteError("unavailable".into()))
        }
    }

    #[tokio::test]
    async fn passes_through_to_backend() {
        let backend = MemoryBackend::new();
        let store = KeyValueStore::new(Arc::new(backend.clone()));

        store.set("k", "v").await;
        assert_eq!(store.get("k").await.as_deref(), Some("v"));
        assert_eq!(backend.len(), 1);

        store.remove("k").await;
        assert!(store.get("k").await.is_none());
        assert!(backend.is_empty());
    }

    #[tokio::test]
    async fn failed_read_is_absence() {
        let store = KeyValueStore::new(Arc::new(BrokenBackend));
        assert!(store.get("anything").await.is_none());
    }

    #[tokio::test]
    async fn failed_write_falls_back_to_memory() {
        let store = KeyValueStore::new(Arc::new(BrokenBackend));

        store.set("OFFLINE_QUEUE", "[1]").await;
        assert_eq!(store.get("OFFLINE_QUEUE").await.as_deref(), Some("[1]"));

        store.set("OFFLINE_QUEUE", "[1,2]").await;
        assert_eq!(store.get("OFFLINE_QUEUE").await.as_deref(), Some("[1,2]"));

        store.remove("OFFLINE_QUEUE").await;
        assert!(store.get("OFFLINE_QUEUE").await.is_none());
    }

    /// Backend that reads fine but refuses writes.
    struct ReadOnlyBackend(MemoryBackend);

    #[async_trait]
    impl StorageBackend for ReadOnlyBackend {
        fn name(&self) -> &'static str {
            "read-only"
        }

        async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
            self.0.get(key).await
        }

        async fn set(&self, _key: &str, _value: &str) -> Result<(), StoreError> {
            Err(StoreError::WriteError("read-only".into()))
        }

        async fn remove(&self, _key: &str) -> Result<(), StoreError> {
            Err(StoreError::WriteError("read-only".into()))
        }
    }

    #[tokio::test]
    async fn fallback_value_shadows_stale_backend_value() {
        let inner = MemoryBackend::new();
        inner.set("OFFLINE_METAS_CACHE", "[]").await.unwrap();
        let store = KeyValueStore::new(Arc::new(ReadOnlyBackend(inner)));

        store.set("OFFLINE_METAS_CACHE", "[{\"Id\":-1}]").await;
        assert_eq!(
            store.get("OFFLINE_METAS_CACHE").await.as_deref(),
            Some("[{\"Id\":-1}]")
        );
    }

    #[tokio::test]
    async fn failed_remove_hides_backend_value() {
        let inner = MemoryBackend::new();
        inner.set("AUTH_TOKEN", "t").await.unwrap();
        let store = KeyValueStore::new(Arc::new(ReadOnlyBackend(inner.clone())));

        assert_eq!(store.get("AUTH_TOKEN").await.as_deref(), Some("t"));
        store.remove("AUTH_TOKEN").await;
        assert!(store.get("AUTH_TOKEN").await.is_none());
        // Durability is lost, not correctness: the backend still has it.
        assert_eq!(inner.get("AUTH_TOKEN").await.unwrap().as_deref(), Some("t"));
    }

    #[tokio::test]
    async fn successful_write_clears_tombstone() {
        let backend = FlakyRemoveBackend(MemoryBackend::new());
        let store = KeyValueStore::new(Arc::new(backend));

        store.set("OFFLINE_QUEUE", "[1]").await;
        store.remove("OFFLINE_QUEUE").await;
        assert!(store.get("OFFLINE_QUEUE").await.is_none());

        store.set("OFFLINE_QUEUE", "[2]").await;
        assert_eq!(store.get("OFFLINE_QUEUE").await.as_deref(), Some("[2]"));
    }

    #[tokio::test]
    async fn queue_clear_sticks_when_remove_fails() {
        use crate::model::{Goal, NewGoal};
        use crate::offline::{PendingOp, PendingQueue};

        let store = Arc::new(KeyValueStore::new(Arc::new(FlakyRemoveBackend(
            MemoryBackend::new(),
        ))));
        let queue: PendingQueue<Goal> = PendingQueue::new(store);
        queue
            .enqueue(PendingOp::Create {
                temp_id: -1,
                payload: NewGoal::titled("A"),
            })
            .await;

        assert_eq!(queue.clear().await, 1);
        assert_eq!(queue.len().await, 0);
    }

    /// Backend that stores normally but refuses removes.
    struct FlakyRemoveBackend(MemoryBackend);

    #[async_trait]
    impl StorageBackend for FlakyRemoveBackend {
        fn name(&self) -> &'static str {
            "flaky-remove"
        }

        async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
            self.0.get(key).await
        }

        async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
            self.0.set(key, value).await
        }

        async fn remove(&self, _key: &str) -> Result<(), StoreError> {
            Err(StoreError::WriteError("remove refused".into()))
        }
    }

    #[test]
    fn debug_names_backend() {
        let store = KeyValueStore::new(Arc::new(MemoryBackend::new()));
        assert!(format!("{:?}", store).contains("memory"));
    }
}
