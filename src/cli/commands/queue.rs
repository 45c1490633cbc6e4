//! cli::commands::queue
//!
//! `gsync sync` and `gsync queue`.
//!
//! # Example
//!
//! ```bash
//! # How much is waiting?
//! gsync queue
//!
//! # Replay it
//! gsync sync
//! ```

use anyhow::{bail, Result};

use super::Context;

/// Drain every pending queue. Fails (exit 1) when operations remain.
pub async fn sync(ctx: &Context, batch: bool) -> Result<()> {
    let _lock = ctx.lock_store().await?;
    let client = ctx.client()?;

    let summary = if batch {
        client.sync_all_batch().await
    } else {
        client.sync_all().await
    };

    ctx.emit(&summary, |s| {
        println!(
            "goals:  {} synced, {} pending",
            s.goals.succeeded, s.goals.failed
        );
        println!(
            "events: {} synced, {} pending",
            s.events.succeeded, s.events.failed
        );
    })?;

    if summary.failed() > 0 {
        bail!("{} operation(s) could not be synced", summary.failed());
    }
    Ok(())
}

/// Show pending counts, or discard everything with `clear`.
pub async fn queue(ctx: &Context, clear: bool) -> Result<()> {
    if clear {
        let _lock = ctx.lock_store().await?;
        let client = ctx.client()?;
        let dropped = client.clear_pending().await;
        return ctx.emit(&dropped, |d| {
            println!("Discarded {} pending operation(s)", d.total());
        });
    }

    let client = ctx.client()?;
    let counts = client.pending_counts().await;
    ctx.emit(&counts, |c| {
        if c.total() == 0 {
            println!("Nothing pending.");
        } else {
            println!("goals:  {} pending", c.goals);
            println!("events: {} pending", c.events);
        }
    })
}
