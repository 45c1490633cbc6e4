//! store::traits
//!
//! Storage backend trait definition.
//!
//! # Design
//!
//! A `StorageBackend` is a flat string-keyed map of string blobs. Blobs are
//! JSON text produced by the offline cache and queue; the backend never
//! interprets them.
//!
//! Backends are allowed to fail. The infallible contract callers rely on is
//! provided one level up by [`KeyValueStore`](super::KeyValueStore), which
//! absorbs backend failures into an in-memory fallback.

use async_trait::async_trait;
use thiserror::Error;

/// Errors from storage backend operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Failed to read from the backing store.
    #[error("failed to read store: {0}")]
    ReadError(String),

    /// Failed to write to the backing store.
    #[error("failed to write store: {0}")]
    WriteError(String),

    /// The backing document exists but cannot be parsed.
    #[error("corrupt store document: {0}")]
    Corrupt(String),

    /// Provider unknown or not usable in this environment.
    #[error("store provider not available: {0}")]
    ProviderNotAvailable(String),
}

/// Trait for storage backends.
///
/// Implementations must be `Send + Sync`; a single backend is shared by the
/// cache, the queue and the session through an `Arc`.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Short backend name for diagnostics (e.g. "file", "memory").
    fn name(&self) -> &'static str;

    /// Read a blob.
    ///
    /// Returns `Ok(None)` if the key has never been written or was removed.
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Write a blob, replacing any previous value.
    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Remove a blob. Removing a missing key is not an error.
    async fn remove(&self, key: &str) -> Result<(), StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = StoreError::ReadError("disk gone".into());
        assert!(err.to_string().contains("read"));

        let err = StoreError::WriteError("read-only fs".into());
        assert!(err.to_string().contains("write"));

        let err = StoreError::Corrupt("expected object".into());
        assert!(err.to_string().contains("corrupt"));

        let err = StoreError::ProviderNotAvailable("sqlite".into());
        assert!(err.to_string().contains("provider"));
    }
}
