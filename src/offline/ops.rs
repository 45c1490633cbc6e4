//! offline::ops
//!
//! Pending operations: mutations accepted locally and awaiting replay.
//!
//! # Wire format
//!
//! ```json
//! {"kind":"create","entity":"Meta","tempId":-1,"payload":{"Titulo":"A"}}
//! {"kind":"update","entity":"Meta","targetId":-1,"payload":{"Titulo":"B"}}
//! ```
//!
//! The `entity` tag must match the resource the queue belongs to; a
//! mismatch is a parse error. A missing tag is accepted.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::model::Resource;

/// A queued mutation against resource `R`.
#[derive(Debug, Clone, PartialEq)]
pub enum PendingOp<R: Resource> {
    /// Offline create; `temp_id` is the local record's negative id.
    Create { temp_id: i64, payload: R::Create },
    /// Offline update; `target_id` may be a temporary id.
    Update { target_id: i64, payload: R::Changes },
}

impl<R: Resource> PendingOp<R> {
    /// `"create"` or `"update"`.
    pub fn kind(&self) -> &'static str {
        match self {
            PendingOp::Create { .. } => "create",
            PendingOp::Update { .. } => "update",
        }
    }

    /// The temporary id a create will be remapped from.
    pub fn temp_id(&self) -> Option<i64> {
        match self {
            PendingOp::Create { temp_id, .. } => Some(*temp_id),
            PendingOp::Update { .. } => None,
        }
    }

    /// The record id this operation refers to.
    pub fn record_id(&self) -> i64 {
        match self {
            PendingOp::Create { temp_id, .. } => *temp_id,
            PendingOp::Update { target_id, .. } => *target_id,
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
enum RawOp<C, U> {
    Create {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        entity: Option<String>,
        #[serde(rename = "tempId")]
        temp_id: i64,
        payload: C,
    },
    Update {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        entity: Option<String>,
        #[serde(rename = "targetId")]
        target_id: i64,
        payload: U,
    },
}

impl<R: Resource> Serialize for PendingOp<R> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let entity = Some(R::ENTITY.to_string());
        let raw: RawOp<&R::Create, &R::Changes> = match self {
            PendingOp::Create { temp_id, payload } => RawOp::Create {
                entity,
                temp_id: *temp_id,
                payload,
            },
            PendingOp::Update { target_id, payload } => RawOp::Update {
                entity,
                target_id: *target_id,
                payload,
            },
        };
        raw.serialize(serializer)
    }
}

impl<'de, R: Resource> Deserialize<'de> for PendingOp<R> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let (entity, op) = match RawOp::<R::Create, R::Changes>::deserialize(deserializer)? {
            RawOp::Create {
                entity,
                temp_id,
                payload,
            } => (entity, PendingOp::Create { temp_id, payload }),
            RawOp::Update {
                entity,
                target_id,
                payload,
            } => (entity, PendingOp::Update { target_id, payload }),
        };

        match entity {
            Some(entity) if entity != R::ENTITY => Err(D::Error::custom(format!(
                "operation for entity '{}' in a '{}' queue",
                entity,
                R::ENTITY
            ))),
            _ => Ok(op),
        }
    }
}
