//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--config <path>`: Use this config file
//! - `--api-url <url>`: Override the server base URL
//! - `--debug`: Enable debug logging
//! - `--json`: Print machine-readable output

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// gsync - offline-first client for the goals API
#[derive(Parser, Debug)]
#[command(name = "gsync")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file (default: $GOALSYNC_CONFIG, XDG, then ~/.goalsync/config.toml)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Server base URL; overrides config and API_BASE_URL
    #[arg(long, global = true, value_name = "URL")]
    pub api_url: Option<String>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// List, create and edit goals
    #[command(subcommand)]
    Goals(GoalsAction),

    /// List, create and edit events
    #[command(subcommand)]
    Events(EventsAction),

    /// Replay pending offline operations against the server
    #[command(
        long_about = "Replay pending offline operations against the server.\n\n\
            Goals are drained before events. Operations that fail stay queued \
            in their original order and are retried by the next sync.",
        after_help = "\
EXAMPLES:
    # One request per pending operation
    gsync sync

    # One request per collection through the batch endpoint
    gsync sync --batch"
    )]
    Sync {
        /// Use the /sync/{collection} batch endpoints
        #[arg(long)]
        batch: bool,
    },

    /// Show (or discard) pending offline operations
    Queue {
        /// Discard every pending operation
        #[arg(long)]
        clear: bool,
    },

    /// Check whether the server is reachable
    Ping,

    /// Store a bearer token for subsequent requests
    Login {
        /// JWT issued by the server
        #[arg(long)]
        token: String,
    },

    /// Forget the stored token
    Logout,
}

/// Goal subcommands.
#[derive(Subcommand, Debug)]
pub enum GoalsAction {
    /// List goals (cached copy when offline)
    List,

    /// Show one goal
    Get { id: i64 },

    /// Create a goal (queued when offline)
    Create {
        /// Goal title
        title: String,

        /// individual or colectiva
        #[arg(long, default_value = "individual")]
        kind: String,

        #[arg(long)]
        description: Option<String>,
    },

    /// Change a goal (queued when offline)
    Update {
        id: i64,

        #[arg(long)]
        title: Option<String>,

        /// individual or colectiva
        #[arg(long)]
        kind: Option<String>,

        /// New description; an empty string clears it
        #[arg(long)]
        description: Option<String>,
    },

    /// Delete a goal (requires a connection)
    Delete { id: i64 },
}

/// Event subcommands.
#[derive(Subcommand, Debug)]
pub enum EventsAction {
    /// List events (cached copy when offline)
    List,

    /// Create an event (queued when offline)
    Create(NewEventArgs),

    /// Change an event (queued when offline)
    Update {
        id: i64,

        #[command(flatten)]
        fields: EventFieldArgs,
    },
}

/// Fields required to create an event.
#[derive(Args, Debug)]
pub struct NewEventArgs {
    /// Goal the event belongs to
    #[arg(long)]
    pub goal: i64,

    /// Event title
    pub title: String,

    /// Start time (RFC 3339)
    #[arg(long)]
    pub start: String,

    /// End time (RFC 3339)
    #[arg(long)]
    pub end: String,

    #[arg(long)]
    pub description: Option<String>,

    #[arg(long)]
    pub location: Option<String>,
}

/// Optional event fields for updates.
#[derive(Args, Debug)]
pub struct EventFieldArgs {
    #[arg(long)]
    pub goal: Option<i64>,

    #[arg(long)]
    pub title: Option<String>,

    #[arg(long)]
    pub start: Option<String>,

    #[arg(long)]
    pub end: Option<String>,

    /// New description; an empty string clears it
    #[arg(long)]
    pub description: Option<String>,

    /// New location; an empty string clears it
    #[arg(long)]
    pub location: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["gsync", "sync", "--batch", "--json", "--debug"]).unwrap();
        assert!(cli.json);
        assert!(cli.debug);
        assert!(matches!(cli.command, Command::Sync { batch: true }));
    }

    #[test]
    fn goals_create_defaults_to_individual() {
        let cli = Cli::try_parse_from(["gsync", "goals", "create", "Correr"]).unwrap();
        match cli.command {
            Command::Goals(GoalsAction::Create { title, kind, .. }) => {
                assert_eq!(title, "Correr");
                assert_eq!(kind, "individual");
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn negative_ids_are_accepted() {
        let cli = Cli::try_parse_from(["gsync", "goals", "update", "--title", "B", "--", "-1"])
            .unwrap();
        assert!(matches!(
            cli.command,
            Command::Goals(GoalsAction::Update { id: -1, .. })
        ));
    }

    #[test]
    fn events_create_requires_times() {
        assert!(Cli::try_parse_from(["gsync", "events", "create", "--goal", "1", "X"]).is_err());
    }
}
