//! Daemon configuration: command-line flags with environment fallbacks.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use revassign_core::AssignmentPolicy;
use tracing::Level;

/// Storage backend selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Backend {
    /// Process-local tables, lost on exit
    Memory,
    /// SurrealDB, connection read from `SURREALDB_*` variables
    Surreal,
}

impl Backend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Backend::Memory => "memory",
            Backend::Surreal => "surreal",
        }
    }
}

#[derive(Debug, Clone, Parser)]
#[command(name = "revassignd")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Pull request reviewer assignment service", long_about = None)]
pub struct Config {
    /// Address to listen on
    #[arg(long, env = "SERVER_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(long, env = "SERVER_PORT", default_value_t = 8080)]
    pub port: u16,

    /// Storage backend
    #[arg(long, env = "REVASSIGN_BACKEND", value_enum, default_value_t = Backend::Memory)]
    pub backend: Backend,

    /// Reviewers assigned to a new pull request
    #[arg(long, env = "REVASSIGN_MAX_REVIEWERS", default_value_t = revassign_core::DEFAULT_MAX_REVIEWERS)]
    pub max_reviewers: usize,

    /// Emit JSON-formatted log lines
    #[arg(long, env = "REVASSIGN_JSON_LOGS")]
    pub json_logs: bool,

    /// Default log level when RUST_LOG is not set
    #[arg(long, env = "REVASSIGN_LOG_LEVEL", default_value = "info")]
    pub log_level: Level,
}

impl Config {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn policy(&self) -> Result<AssignmentPolicy> {
        AssignmentPolicy::new(self.max_reviewers).context("invalid --max-reviewers")
    }
}
