//! store
//!
//! Durable key-value storage for offline state.
//!
//! # Architecture
//!
//! Blobs are stored through the [`StorageBackend`] trait, which has two
//! interchangeable implementations:
//!
//! - [`FileBackend`]: one JSON document at `~/.goalsync/store.json` (default)
//! - [`MemoryBackend`]: process-local map, for tests and environments
//!   without a writable filesystem
//!
//! Callers never talk to a backend directly. They go through
//! [`KeyValueStore`], which never returns an error: backend failures degrade
//! to absence on read and to an in-memory fallback on write.
//!
//! # Provider Selection
//!
//! The backend is chosen once, at construction, with [`create_store`]:
//!
//! ```ignore
//! use goalsync::store::create_store;
//!
//! let store = create_store("file", None)?;
//! store.set("OFFLINE_QUEUE", "[]").await;
//! ```

mod file_backend;
mod kv;
mod memory_backend;
mod traits;

use std::path::PathBuf;
use std::sync::Arc;

pub use file_backend::FileBackend;
pub use kv::KeyValueStore;
pub use memory_backend::MemoryBackend;
pub use traits::{StorageBackend, StoreError};

/// The default store provider name.
pub const DEFAULT_PROVIDER: &str = "file";

/// Valid provider names.
pub fn valid_provider_names() -> &'static [&'static str] {
    &["file", "memory"]
}

/// Create a key-value store for the given provider.
///
/// # Providers
///
/// - `"file"` (default): [`FileBackend`] at `path`, or the default location
/// - `"memory"`: [`MemoryBackend`]; `path` is ignored
///
/// # Errors
///
/// - Unknown provider name
/// - Home directory cannot be determined for the default file location
pub fn create_store(provider: &str, path: Option<PathBuf>) -> Result<KeyValueStore, StoreError> {
    let backend: Arc<dyn StorageBackend> = match provider {
        "file" => match path {
            Some(path) => Arc::new(FileBackend::with_path(path)),
            None => Arc::new(FileBackend::new()?),
        },
        "memory" => Arc::new(MemoryBackend::new()),
        other => {
            return Err(StoreError::ProviderNotAvailable(format!(
                "unknown store provider: '{}' (valid: {})",
                other,
                valid_provider_names().join(", ")
            )))
        }
    };
    tracing::debug!(provider = backend.name(), "store backend selected");
    Ok(KeyValueStore::new(backend))
}
