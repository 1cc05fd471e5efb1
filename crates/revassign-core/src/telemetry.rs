//! Tracing setup for `revassignd` and the `revassign` CLI.
//!
//! The daemon logs to stdout, where its lifecycle events (`pr.created`,
//! `reassign.partial`, ...) and the access log from `TraceLayer` are
//! collected. The CLI prints command results on stdout, so its diagnostics
//! go to stderr instead. SurrealDB's own crates are held at `warn` unless
//! `RUST_LOG` says otherwise; at `debug` they drown out the storage spans.
//!
//! Only the first call installs a subscriber; later calls are no-ops.

use tracing::Level;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Directives used when `RUST_LOG` is unset.
pub fn default_directives(level: Level) -> String {
    format!("{level},surrealdb=warn,surrealdb_core=warn")
}

/// Install the daemon subscriber on stdout.
///
/// `RUST_LOG` wins over `level` when set. With `json` the output is one
/// JSON object per line.
pub fn init_tracing(json: bool, level: Level) {
    install(json, level, std::io::stdout);
}

/// Install the CLI subscriber on stderr, keeping stdout for results.
pub fn init_cli_tracing(json: bool, level: Level) {
    install(json, level, std::io::stderr);
}

fn install<W>(json: bool, level: Level, writer: W)
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(level)));

    if json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_target(false).with_writer(writer).json())
            .try_init()
            .ok();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_target(true).with_writer(writer))
            .try_init()
            .ok();
    }
}
