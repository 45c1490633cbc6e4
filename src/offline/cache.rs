//! offline::cache
//!
//! Last known snapshot of a collection, as one JSON array blob.
//!
//! Absent and empty are different answers: `None` means nothing was ever
//! cached (or the blob is unreadable), `Some(vec![])` means the server said
//! the collection is empty.

use std::marker::PhantomData;
use std::sync::Arc;

use crate::model::Resource;
use crate::store::KeyValueStore;

/// Cached collection of `R` under `R::CACHE_KEY`.
#[derive(Debug)]
pub struct LocalCache<R> {
    store: Arc<KeyValueStore>,
    _resource: PhantomData<fn() -> R>,
}

impl<R> Clone for LocalCache<R> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            _resource: PhantomData,
        }
    }
}

impl<R: Resource> LocalCache<R> {
    pub fn new(store: Arc<KeyValueStore>) -> Self {
        Self {
            store,
            _resource: PhantomData,
        }
    }

    /// Read the snapshot. An unparsable blob reads as absent.
    pub async fn get_cached(&self) -> Option<Vec<R>> {
        let raw = self.store.get(R::CACHE_KEY).await?;
        match serde_json::from_str(&raw) {
            Ok(records) => Some(records),
            Err(e) => {
                tracing::warn!(key = R::CACHE_KEY, error = %e, "cached collection unreadable, ignoring");
                None
            }
        }
    }

    /// Replace the snapshot wholesale.
    pub async fn set_cached(&self, records: &[R]) {
        match serde_json::to_string(records) {
            Ok(blob) => self.store.set(R::CACHE_KEY, &blob).await,
            Err(e) => {
                tracing::warn!(key = R::CACHE_KEY, error = %e, "cannot encode cached collection")
            }
        }
    }

    /// Drop the snapshot.
    pub async fn clear(&self) {
        self.store.remove(R::CACHE_KEY).await;
    }
}
