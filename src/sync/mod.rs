//! sync
//!
//! The reconciliation engine: turns queued offline operations into server
//! calls and folds the results back into the local cache.
//!
//! - [`Reconciler::drain`]: one request per operation, client-side id remap
//! - [`Reconciler::drain_batch`]: one request for the whole queue, server-side
//!   id remap

mod batch;
mod reconciler;

pub use reconciler::{DrainReport, Reconciler};
