//! model::resource
//!
//! The `Resource` trait: everything the offline engine needs to know about a
//! remote collection.
//!
//! # Design
//!
//! Each resource declares its wire entity tag, collection path and store
//! keys as associated constants, plus two closed payload types: `Create`
//! (body of `POST /collection`) and `Changes` (body of
//! `PATCH /collection/{id}`). The same payload types are used for the live
//! call and for replay, so both paths submit identical shapes.
//!
//! # Identifiers
//!
//! `id >= 0` is a server-confirmed record; `id < 0` is a local record
//! created offline and not yet reconciled.

use std::fmt::Debug;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

/// Marker bound shared by records and payloads.
pub trait Wire: Clone + Debug + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static {}

impl<T> Wire for T where
    T: Clone + Debug + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static
{
}

/// A record type of a remote collection.
pub trait Resource: Wire {
    /// Create payload.
    type Create: Wire;
    /// Partial update payload. Absent fields are not serialized.
    type Changes: Wire;

    /// Entity tag stored in pending operations (`"Meta"`).
    const ENTITY: &'static str;
    /// Collection path (`"/metas"`).
    const COLLECTION: &'static str;
    /// Store key of the cached collection.
    const CACHE_KEY: &'static str;
    /// Store key of the pending queue.
    const QUEUE_KEY: &'static str;

    /// Record identifier.
    fn id(&self) -> i64;

    /// Replace the identifier, when a temporary id is confirmed.
    fn set_id(&mut self, id: i64);

    /// Owner carried by a create payload, if any.
    fn create_owner(payload: &Self::Create) -> Option<i64>;

    /// Fill in the owner of a create payload.
    fn set_create_owner(payload: &mut Self::Create, owner: i64);

    /// Build the local record for an offline create.
    ///
    /// The payload's owner has already been resolved; `now` becomes the
    /// creation timestamp.
    fn optimistic(id: i64, payload: &Self::Create, now: DateTime<Utc>) -> Self;

    /// Merge changed fields into this record and stamp `now` as the update
    /// time.
    fn apply_changes(&mut self, changes: &Self::Changes, now: DateTime<Utc>);

    /// Path of a single record.
    fn item_path(id: i64) -> String {
        format!("{}/{}", Self::COLLECTION, id)
    }
}

/// Overlay the fields of a server JSON object onto a record.
///
/// Fields absent from `patch` keep their current value. Used when the server
/// answers an update with a possibly partial representation.
pub fn merge_fields<R: Resource>(record: &R, patch: &Value) -> Result<R, serde_json::Error> {
    let mut base = serde_json::to_value(record)?;
    if let (Some(base), Some(patch)) = (base.as_object_mut(), patch.as_object()) {
        for (key, value) in patch {
            base.insert(key.clone(), value.clone());
        }
    }
    serde_json::from_value(base)
}

/// Whether an identifier belongs to a local, unconfirmed record.
pub fn is_temporary(id: i64) -> bool {
    id < 0
}
