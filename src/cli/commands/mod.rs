//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Each command handler:
//! 1. Validates command-specific arguments
//! 2. Calls the [`OfflineClient`] to do the work
//! 3. Formats and displays output (text, or JSON with `--json`)
//!
//! Handlers that write offline state hold the store's [`SyncLock`] for their
//! whole duration, so two `gsync` processes never interleave writes to the
//! same store document.

mod events;
mod goals;
mod queue;
mod session;

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use serde::Serialize;

use crate::cli::args::Command;
use crate::client::OfflineClient;
use crate::config::Config;
use crate::offline::{SyncLock, DEFAULT_LOCK_TIMEOUT};
use crate::store::FileBackend;

/// Everything a handler needs from the command line.
#[derive(Debug)]
pub struct Context {
    pub config: Config,
    pub json: bool,
}

impl Context {
    /// Build the client described by the configuration.
    pub fn client(&self) -> Result<OfflineClient> {
        OfflineClient::from_config(&self.config).context("opening offline store")
    }

    /// Take the cross-process lock for the configured store.
    ///
    /// The memory provider has no shared document, so there is nothing to
    /// lock and `None` is returned.
    pub async fn lock_store(&self) -> Result<Option<SyncLock>> {
        let Some(path) = self.store_document()? else {
            return Ok(None);
        };
        let lock = SyncLock::acquire(&SyncLock::lock_path_for(&path), DEFAULT_LOCK_TIMEOUT)
            .await
            .context("locking offline store")?;
        Ok(Some(lock))
    }

    fn store_document(&self) -> Result<Option<PathBuf>> {
        if self.config.store_provider() != "file" {
            return Ok(None);
        }
        match self.config.store_path() {
            Some(path) => Ok(Some(path.to_path_buf())),
            None => Ok(Some(FileBackend::default_path()?)),
        }
    }

    /// Print `value` as pretty JSON, or run `text` for plain output.
    pub fn emit<T: Serialize>(&self, value: &T, text: impl FnOnce(&T)) -> Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(value)?);
        } else {
            text(value);
        }
        Ok(())
    }
}

/// Dispatch a command to its handler.
pub async fn dispatch(command: Command, ctx: &Context) -> Result<()> {
    match command {
        Command::Goals(action) => goals::run(ctx, action).await,
        Command::Events(action) => events::run(ctx, action).await,
        Command::Sync { batch } => queue::sync(ctx, batch).await,
        Command::Queue { clear } => queue::queue(ctx, clear).await,
        Command::Ping => session::ping(ctx).await,
        Command::Login { token } => session::login(ctx, &token).await,
        Command::Logout => session::logout(ctx).await,
    }
}

/// Marker shown next to records that only exist locally.
pub(crate) fn pending_marker(id: i64) -> &'static str {
    if crate::model::is_temporary(id) {
        " (pending sync)"
    } else {
        ""
    }
}
