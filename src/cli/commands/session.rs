//! cli::commands::session
//!
//! `gsync login`, `gsync logout` and `gsync ping`.

use anyhow::{bail, Result};
use serde_json::json;

use super::Context;

/// Store a token. The user id comes from the JWT `sub` claim.
pub async fn login(ctx: &Context, token: &str) -> Result<()> {
    let token = token.trim();
    if token.is_empty() {
        bail!("token must not be empty");
    }

    let _lock = ctx.lock_store().await?;
    let client = ctx.client()?;
    let user_id = client.stored_session().store_session(token).await;
    ctx.emit(&json!({ "userId": user_id }), |_| match user_id {
        Some(id) => println!("Logged in as user {}", id),
        None => println!("Token stored (no user id in token; offline creates need one)"),
    })
}

pub async fn logout(ctx: &Context) -> Result<()> {
    let _lock = ctx.lock_store().await?;
    let client = ctx.client()?;
    client.stored_session().clear_session().await;
    ctx.emit(&json!({ "loggedOut": true }), |_| println!("Logged out"))
}

/// Probe the server. Fails (exit 1) when it is unreachable.
pub async fn ping(ctx: &Context) -> Result<()> {
    let client = ctx.client()?;
    let health = client.ping().await;
    ctx.emit(&health, |h| {
        if h.ok {
            println!("{} is reachable", h.url);
        }
    })?;
    if !health.ok {
        bail!("{} is unreachable", health.url);
    }
    Ok(())
}
