//! cli::commands::events
//!
//! `gsync events ...`

use anyhow::{anyhow, bail, Result};
use chrono::{DateTime, Utc};

use super::{pending_marker, Context};
use crate::cli::args::{EventFieldArgs, EventsAction, NewEventArgs};
use crate::model::{nullable, timestamp, Event, EventChanges, NewEvent};

pub async fn run(ctx: &Context, action: EventsAction) -> Result<()> {
    match action {
        EventsAction::List => {
            let client = ctx.client()?;
            let events = client.events().list().await?;
            ctx.emit(&events, |events| {
                if events.is_empty() {
                    println!("No events.");
                }
                for event in events {
                    print_event(event);
                }
            })
        }
        EventsAction::Create(args) => {
            let input = new_event(args)?;

            let _lock = ctx.lock_store().await?;
            let client = ctx.client()?;
            let event = client.events().create(input).await?;
            ctx.emit(&event, |event| {
                println!("Created event {}{}", event.id, pending_marker(event.id));
            })
        }
        EventsAction::Update { id, fields } => {
            let changes = event_changes(fields)?;
            if changes.is_empty() {
                bail!("nothing to update; pass at least one field");
            }

            let _lock = ctx.lock_store().await?;
            let client = ctx.client()?;
            let event = client.events().update(id, changes).await?;
            ctx.emit(&event, |event| {
                println!("Updated event {}{}", event.id, pending_marker(event.id));
            })
        }
    }
}

fn parse_time(flag: &str, value: &str) -> Result<DateTime<Utc>> {
    timestamp::parse(value)
        .ok_or_else(|| anyhow!("--{} '{}' is not a valid timestamp (use RFC 3339)", flag, value))
}

fn new_event(args: NewEventArgs) -> Result<NewEvent> {
    let starts_at = parse_time("start", &args.start)?;
    let ends_at = parse_time("end", &args.end)?;
    if ends_at < starts_at {
        bail!("--end is before --start");
    }
    Ok(NewEvent {
        goal_id: args.goal,
        owner_id: None,
        title: args.title,
        description: args.description,
        starts_at,
        ends_at,
        location: args.location,
    })
}

fn event_changes(fields: EventFieldArgs) -> Result<EventChanges> {
    Ok(EventChanges {
        goal_id: fields.goal,
        title: fields.title,
        description: nullable::from_flag(fields.description),
        starts_at: fields.start.map(|s| parse_time("start", &s)).transpose()?,
        ends_at: fields.end.map(|s| parse_time("end", &s)).transpose()?,
        location: nullable::from_flag(fields.location),
    })
}

fn print_event(event: &Event) {
    println!(
        "{:>6}  goal {:<6} {}  {}{}",
        event.id,
        event.goal_id,
        event.starts_at.format("%Y-%m-%d %H:%M"),
        event.title,
        pending_marker(event.id)
    );
    if let Some(location) = event.location.as_deref().filter(|l| !l.is_empty()) {
        println!("        @ {}", location);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(start: &str, end: &str) -> NewEventArgs {
        NewEventArgs {
            goal: 10,
            title: "Entreno".into(),
            start: start.into(),
            end: end.into(),
            description: None,
            location: Some("Parque".into()),
        }
    }

    #[test]
    fn new_event_parses_times() {
        let event = new_event(args("2024-05-01T08:00:00Z", "2024-05-01T09:00:00Z")).unwrap();
        assert_eq!(event.goal_id, 10);
        assert!(event.ends_at > event.starts_at);
        assert!(event.owner_id.is_none());
    }

    #[test]
    fn new_event_rejects_bad_input() {
        assert!(new_event(args("mañana", "2024-05-01T09:00:00Z")).is_err());
        assert!(new_event(args("2024-05-01T09:00:00Z", "2024-05-01T08:00:00Z")).is_err());
    }

    #[test]
    fn empty_fields_are_empty_changes() {
        let changes = event_changes(EventFieldArgs {
            goal: None,
            title: None,
            start: None,
            end: None,
            description: None,
            location: None,
        })
        .unwrap();
        assert!(changes.is_empty());
    }

    #[test]
    fn empty_location_clears_it() {
        let changes = event_changes(EventFieldArgs {
            goal: None,
            title: None,
            start: None,
            end: None,
            description: None,
            location: Some(String::new()),
        })
        .unwrap();
        assert!(!changes.is_empty());
        assert_eq!(changes.location, Some(None));
        assert_eq!(
            serde_json::to_value(&changes).unwrap(),
            serde_json::json!({"Ubicacion": null})
        );
    }
}
