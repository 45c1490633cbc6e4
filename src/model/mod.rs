//! model
//!
//! Record and payload types of the remote collections, and the
//! [`Resource`] trait the offline engine is generic over.

mod event;
mod goal;
pub mod nullable;
mod resource;
pub mod timestamp;

pub use event::{Event, EventChanges, NewEvent};
pub use goal::{Goal, GoalChanges, GoalKind, NewGoal};
pub use resource::{is_temporary, merge_fields, Resource, Wire};
