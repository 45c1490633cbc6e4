//! offline::lock
//!
//! Single-writer discipline for queues and caches.
//!
//! # Two levels
//!
//! - [`WriterLock`]: an async mutex shared by every service and reconciler
//!   of one client. Holding it makes each create, update or drain one
//!   uninterrupted read-modify-write of the stored blobs.
//! - [`SyncLock`]: an OS-level exclusive lock on a file next to the store,
//!   held by the command-line tool so two processes never mutate the same
//!   store at once.
//!
//! # Example
//!
//! ```ignore
//! use goalsync::offline::{SyncLock, DEFAULT_LOCK_TIMEOUT};
//!
//! let _lock = SyncLock::acquire(&SyncLock::lock_path_for(&store_path), DEFAULT_LOCK_TIMEOUT).await?;
//! // ... drain ...
//! // released on drop
//! ```

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use fs2::FileExt;
use thiserror::Error;

/// In-process writer guard shared by services and reconcilers.
pub type WriterLock = Arc<tokio::sync::Mutex<()>>;

/// Create a fresh writer guard.
pub fn writer_lock() -> WriterLock {
    Arc::new(tokio::sync::Mutex::new(()))
}

/// Default timeout for acquiring the process lock.
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(10);

const LOCK_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Errors from process lock operations.
#[derive(Debug, Error)]
pub enum LockError {
    /// Another process holds the lock.
    #[error("another goalsync process is using the store")]
    Busy,

    /// The lock was not acquired within the timeout.
    #[error("timed out after {0:?} waiting for the store lock")]
    Timeout(Duration),

    /// Filesystem failure.
    #[error("lock error: {0}")]
    Io(String),
}

/// Exclusive cross-process lock, released on drop.
#[derive(Debug)]
pub struct SyncLock {
    path: PathBuf,
    file: Option<File>,
}

impl SyncLock {
    /// Lock file path for a store document: `<store>.lock`.
    pub fn lock_path_for(store_path: &Path) -> PathBuf {
        let mut name = store_path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "store".into());
        name.push(".lock");
        store_path.with_file_name(name)
    }

    /// Acquire the lock, polling until `timeout` expires.
    pub async fn acquire(path: &Path, timeout: Duration) -> Result<Self, LockError> {
        let deadline = Instant::now() + timeout;
        loop {
            match Self::try_acquire(path) {
                Ok(lock) => return Ok(lock),
                Err(LockError::Busy) => {
                    if Instant::now() >= deadline {
                        return Err(LockError::Timeout(timeout));
                    }
                    tracing::debug!(path = %path.display(), "store lock busy, waiting");
                    tokio::time::sleep(LOCK_POLL_INTERVAL).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Try once. Fails with [`LockError::Busy`] if held elsewhere.
    pub fn try_acquire(path: &Path) -> Result<Self, LockError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                LockError::Io(format!("cannot create {}: {}", parent.display(), e))
            })?;
        }

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .map_err(|e| LockError::Io(format!("cannot open {}: {}", path.display(), e)))?;

        match file.try_lock_exclusive() {
            Ok(()) => Ok(Self {
                path: path.to_path_buf(),
                file: Some(file),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => Err(LockError::Busy),
            Err(e) => Err(LockError::Io(format!("lock failed: {}", e))),
        }
    }

    pub fn is_held(&self) -> bool {
        self.file.is_some()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Release early.
    pub fn release(&mut self) -> Result<(), LockError> {
        if let Some(file) = self.file.take() {
            FileExt::unlock(&file).map_err(|e| LockError::Io(format!("unlock failed: {}", e)))?;
        }
        Ok(())
    }
}

impl Drop for SyncLock {
    fn drop(&mut self) {
        if let Some(file) = self.file.take() {
            let _ = FileExt::unlock(&file);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn lock_path_sits_beside_store() {
        let path = SyncLock::lock_path_for(Path::new("/data/goalsync/store.json"));
        assert_eq!(path, PathBuf::from("/data/goalsync/store.json.lock"));
    }

    #[test]
    fn try_acquire_and_release() {
        let temp = TempDir::new().expect("temp dir");
        let path = temp.path().join("nested").join("store.json.lock");

        let mut lock = SyncLock::try_acquire(&path).expect("acquire");
        assert!(lock.is_held());
        assert_eq!(lock.path(), path.as_path());

        lock.release().expect("release");
        assert!(!lock.is_held());
        SyncLock::try_acquire(&path).expect("reacquire after release");
    }

    #[cfg(unix)]
    #[test]
    fn second_acquire_is_busy() {
        let temp = TempDir::new().expect("temp dir");
        let path = temp.path().join("store.json.lock");

        let _held = SyncLock::try_acquire(&path).expect("first");
        assert!(matches!(SyncLock::try_acquire(&path), Err(LockError::Busy)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn acquire_times_out_while_held() {
        let temp = TempDir::new().expect("temp dir");
        let path = temp.path().join("store.json.lock");

        let _held = SyncLock::try_acquire(&path).expect("first");
        let result = SyncLock::acquire(&path, Duration::from_millis(250)).await;
        assert!(matches!(result, Err(LockError::Timeout(_))));
    }

    #[test]
    fn released_on_drop() {
        let temp = TempDir::new().expect("temp dir");
        let path = temp.path().join("store.json.lock");

        {
            let _lock = SyncLock::try_acquire(&path).expect("first");
        }
        SyncLock::try_acquire(&path).expect("second after drop");
    }

    #[tokio::test]
    async fn writer_lock_is_shared() {
        let lock = writer_lock();
        let other = Arc::clone(&lock);
        let _guard = lock.lock().await;
        assert!(other.try_lock().is_err());
    }
}
