//! SurrealDB connection handle
//!
//! Supports embedded (`mem://`, `surrealkv://`) and remote (`ws://`,
//! `wss://`) engines through `surrealdb::engine::any`.

use crate::error::StateError;
use crate::migrations;
use crate::Result;
use surrealdb::engine::any::Any;
use surrealdb::opt::auth::{Database, Root};
use surrealdb::Surreal;
use tracing::{info, instrument};

const DEFAULT_URL: &str = "surrealkv://.revassign/db";
const DEFAULT_NAMESPACE: &str = "revassign";
const DEFAULT_DATABASE: &str = "main";

/// Sign-in credentials for a remote SurrealDB
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
    /// Root user (true) or database user (false)
    pub is_root: bool,
}

/// Configuration for a SurrealDB connection
#[derive(Debug, Clone)]
pub struct SurrealConfig {
    /// Engine URL, e.g. `ws://localhost:8000` or `surrealkv://data/db`
    pub url: String,
    pub namespace: String,
    pub database: String,
    pub credentials: Option<Credentials>,
}

impl Default for SurrealConfig {
    fn default() -> Self {
        Self::new(DEFAULT_URL)
    }
}

impl SurrealConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            namespace: DEFAULT_NAMESPACE.to_string(),
            database: DEFAULT_DATABASE.to_string(),
            credentials: None,
        }
    }

    /// Set custom namespace
    pub fn with_namespace(mut self, ns: impl Into<String>) -> Self {
        self.namespace = ns.into();
        self
    }

    /// Set custom database
    pub fn with_database(mut self, db: impl Into<String>) -> Self {
        self.database = db.into();
        self
    }

    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Create from environment variables
    ///
    /// Reads:
    /// - SURREALDB_URL (optional, default: "surrealkv://.revassign/db")
    /// - SURREALDB_NAMESPACE (optional, default: "revassign")
    /// - SURREALDB_DATABASE (optional, default: "main")
    /// - SURREALDB_USERNAME / SURREALDB_PASSWORD (optional, both or neither)
    /// - SURREALDB_ROOT (optional, default: "false") - set to "true" for root users
    pub fn from_env() -> Self {
        let url = std::env::var("SURREALDB_URL").unwrap_or_else(|_| DEFAULT_URL.to_string());
        let namespace = std::env::var("SURREALDB_NAMESPACE")
            .unwrap_or_else(|_| DEFAULT_NAMESPACE.to_string());
        let database =
            std::env::var("SURREALDB_DATABASE").unwrap_or_else(|_| DEFAULT_DATABASE.to_string());

        let credentials = match (
            std::env::var("SURREALDB_USERNAME"),
            std::env::var("SURREALDB_PASSWORD"),
        ) {
            (Ok(username), Ok(password)) => Some(Credentials {
                username,
                password,
                is_root: std::env::var("SURREALDB_ROOT")
                    .map(|v| v.to_lowercase() == "true")
                    .unwrap_or(false),
            }),
            _ => None,
        };

        Self {
            url,
            namespace,
            database,
            credentials,
        }
    }
}

/// SurrealDB connection handle with the revassign schema applied
#[derive(Clone)]
pub struct SurrealHandle {
    db: Surreal<Any>,
}

impl SurrealHandle {
    /// Connect to a fresh in-memory database and set up the schema
    #[instrument(skip_all)]
    pub async fn in_memory() -> Result<Self> {
        Self::connect(&SurrealConfig::new("mem://")).await
    }

    /// Connect using [`SurrealConfig::from_env`]
    pub async fn from_env() -> Result<Self> {
        Self::connect(&SurrealConfig::from_env()).await
    }

    /// Connect, sign in when credentials are set, select namespace/database
    /// and run migrations.
    #[instrument(skip(config), fields(url = %config.url, namespace = %config.namespace, database = %config.database))]
    pub async fn connect(config: &SurrealConfig) -> Result<Self> {
        info!("Connecting to SurrealDB");

        if let Some(path) = config.url.strip_prefix("surrealkv://") {
            std::fs::create_dir_all(path).map_err(|e| {
                StateError::Connection(format!(
                    "Failed to create database directory {}: {}",
                    path, e
                ))
            })?;
        }

        let db = surrealdb::engine::any::connect(config.url.as_str())
            .await
            .map_err(|e| {
                StateError::Connection(format!("Failed to connect to {}: {}", config.url, e))
            })?;

        if let Some(creds) = &config.credentials {
            if creds.is_root {
                db.signin(Root {
                    username: &creds.username,
                    password: &creds.password,
                })
                .await
                .map_err(|e| StateError::Connection(format!("Root authentication failed: {}", e)))?;
            } else {
                db.signin(Database {
                    namespace: &config.namespace,
                    database: &config.database,
                    username: &creds.username,
                    password: &creds.password,
                })
                .await
                .map_err(|e| {
                    StateError::Connection(format!("Database authentication failed: {}", e))
                })?;
            }
        }

        db.use_ns(&config.namespace)
            .use_db(&config.database)
            .await
            .map_err(|e| {
                StateError::Connection(format!("Failed to select namespace/database: {}", e))
            })?;

        migrations::init_schema(&db)
            .await
            .map_err(|e| StateError::SchemaSetup(e.to_string()))?;

        info!("SurrealDB connected and schema initialized");
        Ok(SurrealHandle { db })
    }

    /// Underlying client
    pub fn db(&self) -> &Surreal<Any> {
        &self.db
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults() {
        let config = SurrealConfig::default();
        assert_eq!(config.url, "surrealkv://.revassign/db");
        assert_eq!(config.namespace, "revassign");
        assert_eq!(config.database, "main");
        assert!(config.credentials.is_none());
    }

    #[test]
    fn config_builders_override_defaults() {
        let config = SurrealConfig::new("ws://localhost:8000")
            .with_namespace("ns")
            .with_database("db")
            .with_credentials(Credentials {
                username: "root".into(),
                password: "secret".into(),
                is_root: true,
            });
        assert_eq!(config.namespace, "ns");
        assert_eq!(config.database, "db");
        assert!(config.credentials.as_ref().is_some_and(|c| c.is_root));
    }

    #[tokio::test]
    async fn in_memory_connects_and_migrates_twice() {
        let handle = SurrealHandle::in_memory().await.unwrap();
        migrations::init_schema(handle.db()).await.unwrap();
    }
}
