//! goalsync - offline mutation queue and reconciliation for the goals API
//!
//! Creates and updates issued while the server is unreachable are applied
//! optimistically to a local cache and recorded in a durable queue. A later
//! sync replays the queue in order, swaps temporary negative ids for the ids
//! the server assigns, and keeps whatever still fails for the next attempt.
//!
//! # Architecture
//!
//! - [`store`] - Durable key-value storage (file or memory backend)
//! - [`offline`] - Local cache, pending queue and writer locks
//! - [`api`] - HTTP transport, error taxonomy and a scripted mock
//! - [`auth`] - Bearer token and user id session
//! - [`model`] - Goal and event records, the generic [`model::Resource`]
//! - [`service`] - Network-first CRUD with optimistic offline fallback
//! - [`sync`] - Queue draining and temporary id remapping
//! - [`client`] - Facade wiring all of the above per configuration
//! - [`config`] - TOML configuration with environment overrides
//! - [`cli`] - The `gsync` command-line tool
//!
//! # Invariants
//!
//! 1. Temporary ids are negative and never collide with cached or queued ids
//! 2. Queued operations replay in enqueue order
//! 3. An operation leaves the queue only when the server accepted it
//! 4. Only network-class failures (no response, timeout) trigger offline
//!    fallback; HTTP error statuses always reach the caller

pub mod api;
pub mod auth;
pub mod cli;
pub mod client;
pub mod config;
pub mod logging;
pub mod model;
pub mod offline;
pub mod service;
pub mod store;
pub mod sync;
