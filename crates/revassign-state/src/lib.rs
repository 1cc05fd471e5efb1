//! revassign-state: storage collaborators for reviewer assignment
//!
//! This crate owns every persisted entity of the service: users, teams,
//! pull requests and reviewer assignment edges. The engine above it sees
//! only the four traits in [`storage_traits`].
//!
//! ## Layer 0 - Data/Persistence
//!
//! Focus: data integrity and swappable backends.
//!
//! ## Key Components
//!
//! - `MemoryStore`: lock-guarded in-memory tables, deterministic selection
//! - `SurrealStore`: SurrealDB tables with unique indexes, random selection
//! - `SurrealHandle`: connection, sign-in and migrations
//! - `Stores`: the collaborator bundle handed to the engine

mod error;
mod handle;
pub mod memory;
pub mod migrations;
mod schema;
pub mod storage_traits;
pub mod surreal_store;

pub use error::{StateError, StorageError};
pub use handle::{Credentials, SurrealConfig, SurrealHandle};
pub use memory::MemoryStore;
pub use storage_traits::{
    AssignmentLedger, PullRequest, PullRequestId, PullRequestStatus, PullRequestStore,
    ReviewerLoad, StorageResult, Stores, Team, TeamDirectory, TeamSize, User, UserDirectory,
    UserId,
};
pub use surreal_store::SurrealStore;

/// Result type for revassign-state connection and schema operations
pub type Result<T> = std::result::Result<T, StateError>;
