//! offline
//!
//! Local state that lets writes proceed without a connection: the cached
//! collection snapshot and the queue of operations awaiting replay. Both
//! live in the [`KeyValueStore`](crate::store::KeyValueStore) as JSON
//! arrays, one pair of keys per resource.
//!
//! Every read-modify-write of that state runs under a [`WriterLock`].

mod cache;
mod lock;
mod ops;
mod queue;

pub use cache::LocalCache;
pub use lock::{writer_lock, LockError, SyncLock, WriterLock, DEFAULT_LOCK_TIMEOUT};
pub use ops::PendingOp;
pub use queue::PendingQueue;
