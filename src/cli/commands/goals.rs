//! cli::commands::goals
//!
//! `gsync goals ...`
//!
//! # Example
//!
//! ```bash
//! gsync goals list
//! gsync goals create "Correr 5k" --kind colectiva
//! gsync goals update 10 --title "Correr 10k"
//! # Negative ids address records still waiting for sync
//! gsync goals update --title "Correr 10k" -- -1
//! ```

use anyhow::{bail, Result};

use super::{pending_marker, Context};
use crate::cli::args::GoalsAction;
use crate::model::{nullable, Goal, GoalChanges, GoalKind, NewGoal};

pub async fn run(ctx: &Context, action: GoalsAction) -> Result<()> {
    match action {
        GoalsAction::List => {
            let client = ctx.client()?;
            let goals = client.goals().list().await?;
            ctx.emit(&goals, |goals| {
                if goals.is_empty() {
                    println!("No goals.");
                }
                for goal in goals {
                    print_goal(goal);
                }
            })
        }
        GoalsAction::Get { id } => {
            let client = ctx.client()?;
            let goal = client.goals().get(id).await?;
            ctx.emit(&goal, print_goal)
        }
        GoalsAction::Create {
            title,
            kind,
            description,
        } => {
            let kind: GoalKind = kind.parse().map_err(anyhow::Error::msg)?;
            let input = NewGoal {
                owner_id: None,
                title,
                kind,
                description,
            };

            let _lock = ctx.lock_store().await?;
            let client = ctx.client()?;
            let goal = client.goals().create(input).await?;
            ctx.emit(&goal, |goal| {
                println!("Created goal {}{}", goal.id, pending_marker(goal.id));
            })
        }
        GoalsAction::Update {
            id,
            title,
            kind,
            description,
        } => {
            let changes = GoalChanges {
                title,
                description: nullable::from_flag(description),
                kind: kind
                    .map(|k| k.parse::<GoalKind>())
                    .transpose()
                    .map_err(anyhow::Error::msg)?,
            };
            if changes.is_empty() {
                bail!("nothing to update; pass --title, --kind or --description");
            }

            let _lock = ctx.lock_store().await?;
            let client = ctx.client()?;
            let goal = client.goals().update(id, changes).await?;
            ctx.emit(&goal, |goal| {
                println!("Updated goal {}{}", goal.id, pending_marker(goal.id));
            })
        }
        GoalsAction::Delete { id } => {
            let client = ctx.client()?;
            client.goals().delete(id).await?;
            ctx.emit(&serde_json::json!({ "deleted": id }), |_| {
                println!("Deleted goal {}", id);
            })
        }
    }
}

fn print_goal(goal: &Goal) {
    println!(
        "{:>6}  {:<11} {}{}",
        goal.id,
        goal.kind.to_string(),
        goal.title,
        pending_marker(goal.id)
    );
    if let Some(description) = goal.description.as_deref().filter(|d| !d.is_empty()) {
        println!("        {}", description);
    }
}
