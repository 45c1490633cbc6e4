//! store::file_backend
//!
//! File-based storage backend.
//!
//! # Layout
//!
//! - All keys live in one JSON object document, `~/.goalsync/store.json` by
//!   default
//! - Writes are atomic (write to temp file, then rename)
//! - On Unix the document is created with 0600 permissions, since it also
//!   holds the session token
//!
//! # Example
//!
//! ```ignore
//! use goalsync::store::{FileBackend, StorageBackend};
//!
//! let backend = FileBackend::new()?;
//! backend.set("OFFLINE_QUEUE", "[]").await?;
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use super::traits::{StorageBackend, StoreError};

/// File-based storage backend.
#[derive(Debug)]
pub struct FileBackend {
    /// Path to the store document
    path: PathBuf,
    /// Serializes read-modify-write cycles on the document within this process
    write_lock: Mutex<()>,
}

impl FileBackend {
    /// Create a backend at the default location (`~/.goalsync/store.json`).
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined.
    pub fn new() -> Result<Self, StoreError> {
        Ok(Self::with_path(Self::default_path()?))
    }

    /// Create a backend at a custom path.
    pub fn with_path(path: PathBuf) -> Self {
        Self {
            path,
            write_lock: Mutex::new(()),
        }
    }

    /// Default document location.
    pub fn default_path() -> Result<PathBuf, StoreError> {
        let home = dirs::home_dir()
            .ok_or_else(|| StoreError::ReadError("cannot determine home directory".into()))?;
        Ok(home.join(".goalsync").join("store.json"))
    }

    /// Get the path to the store document.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the whole document. A missing file is an empty document.
    async fn read_document(&self) -> Result<BTreeMap<String, String>, StoreError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => {
                return Err(StoreError::ReadError(format!(
                    "cannot read {}: {}",
                    self.path.display(),
                    e
                )))
            }
        };

        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }

        serde_json::from_str(&content).map_err(|e| {
            StoreError::Corrupt(format!("cannot parse {}: {}", self.path.display(), e))
        })
    }

    /// Write the whole document atomically.
    async fn write_document(&self, entries: &BTreeMap<String, String>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StoreError::WriteError(format!("cannot create directory: {}", e)))?;
        }

        let content = serde_json::to_string_pretty(entries)
            .map_err(|e| StoreError::WriteError(format!("cannot serialize store: {}", e)))?;

        let temp_path = self.path.with_extension("tmp");

        {
            let mut options = tokio::fs::OpenOptions::new();
            options.write(true).create(true).truncate(true);
            #[cfg(unix)]
            options.mode(0o600);

            let mut file = options
                .open(&temp_path)
                .await
                .map_err(|e| StoreError::WriteError(format!("cannot create temp file: {}", e)))?;

            file.write_all(content.as_bytes())
                .await
                .map_err(|e| StoreError::WriteError(format!("cannot write store: {}", e)))?;

            file.sync_all()
                .await
                .map_err(|e| StoreError::WriteError(format!("cannot sync to disk: {}", e)))?;
        }

        tokio::fs::rename(&temp_path, &self.path)
            .await
            .map_err(|e| StoreError::WriteError(format!("cannot rename temp file: {}", e)))?;

        Ok(())
    }
}

#[async_trait]
impl StorageBackend for FileBackend {
    fn name(&self) -> &'static str {
        "file"
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let entries = self.read_document().await?;
        Ok(entries.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut entries = self.read_document().await?;
        entries.insert(key.to_string(), value.to_string());
        self.write_document(&entries).await
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut entries = self.read_document().await?;
        if entries.remove(key).is_none() {
            return Ok(());
        }
        self.write_document(&entries).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_backend() -> (TempDir, FileBackend) {
        let temp = TempDir::new().expect("create temp dir");
        let backend = FileBackend::with_path(temp.path().join("store.json"));
        (temp, backend)
    }

    #[tokio::test]
    async fn get_nonexistent_returns_none() {
        let (_temp, backend) = create_test_backend();
        assert!(backend.get("missing").await.expect("get").is_none());
    }

    #[tokio::test]
    async fn set_and_get() {
        let (_temp, backend) = create_test_backend();
        backend.set("OFFLINE_QUEUE", "[]").await.expect("set");
        assert_eq!(
            backend.get("OFFLINE_QUEUE").await.expect("get").as_deref(),
            Some("[]")
        );
    }

    #[tokio::test]
    async fn remove_missing_is_ok() {
        let (_temp, backend) = create_test_backend();
        backend.remove("nothing").await.expect("remove");
        assert!(!backend.path().exists());
    }

    #[tokio::test]
    async fn creates_directory_if_missing() {
        let temp = TempDir::new().expect("create temp dir");
        let path = temp.path().join("nested").join("store.json");
        let backend = FileBackend::with_path(path.clone());

        backend.set("k", "v").await.expect("set");
        assert!(path.exists());
    }

    #[tokio::test]
    async fn persistence_across_instances() {
        let temp = TempDir::new().expect("create temp dir");
        let path = temp.path().join("store.json");

        {
            let backend = FileBackend::with_path(path.clone());
            backend.set("k", "{\"a\":1}").await.expect("set");
        }

        let backend = FileBackend::with_path(path);
        assert_eq!(
            backend.get("k").await.expect("get").as_deref(),
            Some("{\"a\":1}")
        );
    }

    #[tokio::test]
    async fn corrupt_document_is_reported() {
        let (_temp, backend) = create_test_backend();
        std::fs::write(backend.path(), "{not json").expect("write garbage");

        let err = backend.get("k").await.unwrap_err();
        assert!(matches!(err, StoreError::Corrupt(_)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn permissions_0600_on_unix() {
        use std::os::unix::fs::PermissionsExt;

        let (_temp, backend) = create_test_backend();
        backend.set("AUTH_TOKEN", "t").await.expect("set");

        let mode = std::fs::metadata(backend.path())
            .expect("metadata")
            .permissions()
            .mode()
            & 0o777;
        assert_eq!(mode, 0o600);
    }
}
