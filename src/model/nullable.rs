//! model::nullable
//!
//! Serde support for update fields that can be left alone, set, or cleared:
//!
//! | Rust | JSON |
//! |---|---|
//! | `None` | key absent (field unchanged) |
//! | `Some(None)` | `null` (field cleared) |
//! | `Some(Some(v))` | `v` |
//!
//! Use with `#[serde(default, skip_serializing_if = "Option::is_none",
//! deserialize_with = "nullable::deserialize")]`. Serialization needs no
//! helper.

use serde::{Deserialize, Deserializer};

/// Read a present key, `null` included, as `Some`.
pub fn deserialize<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Command-line convention: an empty string clears the field.
pub fn from_flag(value: Option<String>) -> Option<Option<String>> {
    value.map(|v| (!v.is_empty()).then_some(v))
}
