//! cli
//!
//! Command-line interface layer for gsync.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Resolve configuration and install logging
//! - Delegate to command handlers, which talk to [`crate::client`]
//!
//! The CLI owns the only tokio runtime in the binary; handlers are async.

pub mod args;
pub mod commands;

pub use args::Cli;

use anyhow::{Context as _, Result};

use crate::config::Config;
use commands::Context;

/// Run the CLI application.
///
/// This is the main entry point called from `main.rs`.
pub fn run() -> Result<()> {
    let cli = Cli::parse_args();
    crate::logging::init(cli.debug);

    let mut config = Config::load(cli.config.as_deref()).context("loading configuration")?;
    if let Some(url) = &cli.api_url {
        config = config.with_api_base_url(url).context("--api-url")?;
    }

    let ctx = Context {
        config,
        json: cli.json,
    };

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(commands::dispatch(cli.command, &ctx))
}
