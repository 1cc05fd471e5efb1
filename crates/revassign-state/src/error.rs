//! Error types for revassign-state

use thiserror::Error;

/// Errors raised while connecting to or preparing the SurrealDB backend
#[derive(Error, Debug)]
pub enum StateError {
    /// Database connection error
    #[error("Database connection failed: {0}")]
    Connection(String),

    /// Database query error
    #[error("Database query failed: {0}")]
    Query(String),

    /// Schema setup error
    #[error("Schema setup failed: {0}")]
    SchemaSetup(String),
}

impl From<surrealdb::Error> for StateError {
    fn from(err: surrealdb::Error) -> Self {
        StateError::Query(err.to_string())
    }
}

/// Errors returned by the collaborator traits in [`crate::storage_traits`]
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("user not found: {user_id}")]
    UserNotFound { user_id: String },

    #[error("team not found: {team_name}")]
    TeamNotFound { team_name: String },

    #[error("pull request not found: {pull_request_id}")]
    PullRequestNotFound { pull_request_id: String },

    /// A record with the same identity is already stored
    #[error("{kind} already exists: {id}")]
    Duplicate { kind: &'static str, id: String },

    /// Backend failure (query error, poisoned lock, undecodable row)
    #[error("storage backend error: {0}")]
    Backend(String),
}

impl From<surrealdb::Error> for StorageError {
    fn from(err: surrealdb::Error) -> Self {
        StorageError::Backend(err.to_string())
    }
}

impl From<StateError> for StorageError {
    fn from(err: StateError) -> Self {
        StorageError::Backend(err.to_string())
    }
}
