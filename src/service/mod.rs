//! service
//!
//! The resource service: what callers use to read and write a collection.
//! It hides whether a write reached the server or was accepted locally for
//! later replay.

mod resource_service;

pub use resource_service::{next_temp_id, ResourceService};
