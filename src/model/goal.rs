//! model::goal
//!
//! Goals (`Meta` on the wire, collection `/metas`).

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::nullable;
use super::resource::Resource;
use super::timestamp;

/// Goal type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GoalKind {
    #[default]
    Individual,
    Colectiva,
}

impl std::fmt::Display for GoalKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GoalKind::Individual => write!(f, "Individual"),
            GoalKind::Colectiva => write!(f, "Colectiva"),
        }
    }
}

impl FromStr for GoalKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "individual" => Ok(GoalKind::Individual),
            "colectiva" | "collective" => Ok(GoalKind::Colectiva),
            _ => Err(format!(
                "unknown goal kind '{}' (expected Individual or Colectiva)",
                s
            )),
        }
    }
}

/// A goal record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Goal {
    #[serde(rename = "Id")]
    pub id: i64,
    #[serde(rename = "PropietarioId", default)]
    pub owner_id: i64,
    #[serde(rename = "Titulo")]
    pub title: String,
    #[serde(rename = "Descripcion", default)]
    pub description: Option<String>,
    #[serde(rename = "TipoMeta", default)]
    pub kind: GoalKind,
    #[serde(rename = "CreadoEn", default, with = "timestamp::option")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(rename = "ActualizadoEn", default, with = "timestamp::option")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(rename = "EliminadoEn", default, with = "timestamp::option")]
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Create payload for `POST /metas`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewGoal {
    /// Resolved from the session when absent.
    #[serde(
        rename = "PropietarioId",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub owner_id: Option<i64>,
    #[serde(rename = "Titulo")]
    pub title: String,
    #[serde(rename = "TipoMeta", default)]
    pub kind: GoalKind,
    #[serde(rename = "Descripcion", default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl NewGoal {
    /// An individual goal with only a title.
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            owner_id: None,
            title: title.into(),
            kind: GoalKind::Individual,
            description: None,
        }
    }
}

/// Update payload for `PATCH /metas/{id}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GoalChanges {
    #[serde(rename = "Titulo", default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// `Some(None)` clears the description.
    #[serde(
        rename = "Descripcion",
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "nullable::deserialize"
    )]
    pub description: Option<Option<String>>,
    #[serde(rename = "TipoMeta", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<GoalKind>,
}

impl GoalChanges {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none() && self.kind.is_none()
    }
}

impl Resource for Goal {
    type Create = NewGoal;
    type Changes = GoalChanges;

    const ENTITY: &'static str = "Meta";
    const COLLECTION: &'static str = "/metas";
    const CACHE_KEY: &'static str = "OFFLINE_METAS_CACHE";
    const QUEUE_KEY: &'static str = "OFFLINE_QUEUE";

    fn id(&self) -> i64 {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = id;
    }

    fn create_owner(payload: &NewGoal) -> Option<i64> {
        payload.owner_id
    }

    fn set_create_owner(payload: &mut NewGoal, owner: i64) {
        payload.owner_id = Some(owner);
    }

    fn optimistic(id: i64, payload: &NewGoal, now: DateTime<Utc>) -> Self {
        Goal {
            id,
            owner_id: payload.owner_id.unwrap_or_default(),
            title: payload.title.clone(),
            description: payload.description.clone(),
            kind: payload.kind,
            created_at: Some(now),
            updated_at: None,
            deleted_at: None,
        }
    }

    fn apply_changes(&mut self, changes: &GoalChanges, now: DateTime<Utc>) {
        if let Some(title) = &changes.title {
            self.title = title.clone();
        }
        if let Some(description) = &changes.description {
            self.description = description.clone();
        }
        if let Some(kind) = changes.kind {
            self.kind = kind;
        }
        self.updated_at = Some(now);
    }
}
