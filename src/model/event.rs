//! model::event
//!
//! Events (`Evento` on the wire, collection `/eventos`). Every event belongs
//! to a goal through `MetaId`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::nullable;
use super::resource::Resource;
use super::timestamp;

/// An event record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    #[serde(rename = "Id")]
    pub id: i64,
    #[serde(rename = "MetaId")]
    pub goal_id: i64,
    #[serde(rename = "PropietarioId", default)]
    pub owner_id: i64,
    #[serde(rename = "Titulo")]
    pub title: String,
    #[serde(rename = "Descripcion", default)]
    pub description: Option<String>,
    #[serde(rename = "Inicio", with = "timestamp")]
    pub starts_at: DateTime<Utc>,
    #[serde(rename = "Fin", with = "timestamp")]
    pub ends_at: DateTime<Utc>,
    #[serde(rename = "Ubicacion", default)]
    pub location: Option<String>,
    #[serde(rename = "CreadoEn", default, with = "timestamp::option")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(rename = "ActualizadoEn", default, with = "timestamp::option")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(rename = "EliminadoEn", default, with = "timestamp::option")]
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Create payload for `POST /eventos`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewEvent {
    #[serde(rename = "MetaId")]
    pub goal_id: i64,
    #[serde(
        rename = "PropietarioId",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub owner_id: Option<i64>,
    #[serde(rename = "Titulo")]
    pub title: String,
    #[serde(rename = "Descripcion", default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "Inicio", with = "timestamp")]
    pub starts_at: DateTime<Utc>,
    #[serde(rename = "Fin", with = "timestamp")]
    pub ends_at: DateTime<Utc>,
    #[serde(rename = "Ubicacion", default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

/// Update payload for `PATCH /eventos/{id}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventChanges {
    #[serde(rename = "MetaId", default, skip_serializing_if = "Option::is_none")]
    pub goal_id: Option<i64>,
    #[serde(rename = "Titulo", default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(
        rename = "Descripcion",
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "nullable::deserialize"
    )]
    pub description: Option<Option<String>>,
    #[serde(
        rename = "Inicio",
        default,
        skip_serializing_if = "Option::is_none",
        with = "timestamp::option"
    )]
    pub starts_at: Option<DateTime<Utc>>,
    #[serde(
        rename = "Fin",
        default,
        skip_serializing_if = "Option::is_none",
        with = "timestamp::option"
    )]
    pub ends_at: Option<DateTime<Utc>>,
    #[serde(
        rename = "Ubicacion",
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "nullable::deserialize"
    )]
    pub location: Option<Option<String>>,
}

impl EventChanges {
    pub fn is_empty(&self) -> bool {
        *self == EventChanges::default()
    }
}

impl Resource for Event {
    type Create = NewEvent;
    type Changes = EventChanges;

    const ENTITY: &'static str = "Evento";
    const COLLECTION: &'static str = "/eventos";
    const CACHE_KEY: &'static str = "OFFLINE_EVENTOS_CACHE";
    const QUEUE_KEY: &'static str = "OFFLINE_QUEUE_EVENTS";

    fn id(&self) -> i64 {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = id;
    }

    fn create_owner(payload: &NewEvent) -> Option<i64> {
        payload.owner_id
    }

    fn set_create_owner(payload: &mut NewEvent, owner: i64) {
        payload.owner_id = Some(owner);
    }

    fn optimistic(id: i64, payload: &NewEvent, now: DateTime<Utc>) -> Self {
        Event {
            id,
            goal_id: payload.goal_id,
            owner_id: payload.owner_id.unwrap_or_default(),
            title: payload.title.clone(),
            description: payload.description.clone(),
            starts_at: payload.starts_at,
            ends_at: payload.ends_at,
            location: payload.location.clone(),
            created_at: Some(now),
            updated_at: None,
            deleted_at: None,
        }
    }

    fn apply_changes(&mut self, changes: &EventChanges, now: DateTime<Utc>) {
        if let Some(goal_id) = changes.goal_id {
            self.goal_id = goal_id;
        }
        if let Some(title) = &changes.title {
            self.title = title.clone();
        }
        if let Some(description) = &changes.description {
            self.description = description.clone();
        }
        if let Some(starts_at) = changes.starts_at {
            self.starts_at = starts_at;
        }
        if let Some(ends_at) = changes.ends_at {
            self.ends_at = ends_at;
        }
        if let Some(location) = &changes.location {
            self.location = location.clone();
        }
        self.updated_at = Some(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn decodes_server_record() {
        let event: Event = serde_json::from_value(json!({
            "Id": 3,
            "MetaId": 10,
            "PropietarioId": 1,
            "Titulo": "Entreno",
            "Inicio": "2024-05-01T10:00:00",
            "Fin": "2024-05-01T11:00:00Z",
            "Ubicacion": "Parque"
        }))
        .unwrap();
        assert_eq!(event.goal_id, 10);
        assert_eq!(
            event.ends_at,
            Utc.with_ymd_and_hms(2024, 5, 1, 11, 0, 0).unwrap()
        );
        assert_eq!(event.location.as_deref(), Some("Parque"));
    }

    #[test]
    fn changes_serialize_only_present_fields() {
        let start = Utc.with_ymd_and_hms(2024, 5, 2, 9, 0, 0).unwrap();
        let changes = EventChanges {
            starts_at: Some(start),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(&changes).unwrap(),
            json!({"Inicio": "2024-05-02T09:00:00+00:00"})
        );
        assert!(EventChanges::default().is_empty());
        assert!(!changes.is_empty());
    }

    #[test]
    fn optimistic_record_copies_payload() {
        let start = Utc.with_ymd_and_hms(2024, 5, 2, 9, 0, 0).unwrap();
        let payload = NewEvent {
            goal_id: 10,
            owner_id: Some(2),
            title: "Entreno".into(),
            description: None,
            starts_at: start,
            ends_at: start,
            location: None,
        };
        let now = Utc::now();
        let mut event = Event::optimistic(-4, &payload, now);
        assert_eq!(event.id(), -4);
        assert_eq!(event.goal_id, 10);
        assert_eq!(event.created_at, Some(now));

        event.apply_changes(
            &EventChanges {
                location: Some(Some("Pista".into())),
                ..Default::default()
            },
            now,
        );
        assert_eq!(event.location.as_deref(), Some("Pista"));
        assert_eq!(event.title, "Entreno");

        event.apply_changes(
            &EventChanges {
                location: Some(None),
                ..Default::default()
            },
            now,
        );
        assert!(event.location.is_none());
    }
}
