//! Diagnostic tracing for the command-line tool.
//!
//! Output goes to stderr so that stdout stays clean for command output,
//! including `--json`.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global subscriber.
///
/// `RUST_LOG` wins when set. Otherwise the level is `warn`, or
/// `goalsync=debug` with `debug`.
///
/// # Example
/// ```bash
/// RUST_LOG=goalsync=trace gsync sync
/// ```
pub fn init(debug: bool) {
    let default = if debug { "warn,goalsync=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    // A second init (tests, embedding) keeps the first subscriber.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .try_init();
}
