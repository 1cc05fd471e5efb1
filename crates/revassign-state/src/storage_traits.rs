//! Storage trait definitions for revassign
//!
//! These traits define the four collaborators the assignment engine reads
//! and writes through:
//! - `TeamDirectory`: team existence
//! - `UserDirectory`: user profiles and reviewer-candidate queries
//! - `AssignmentLedger`: reviewer <-> pull request edges
//! - `PullRequestStore`: pull request lifecycle records
//!
//! All traits are async and backend-agnostic. The in-memory backend lives in
//! [`crate::memory`], the SurrealDB backend in [`crate::surreal_store`].

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StorageError;

/// Result type for storage operations
pub type StorageResult<T> = std::result::Result<T, StorageError>;

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

/// Unique identifier of a user
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        UserId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        UserId(s.to_string())
    }
}

impl From<String> for UserId {
    fn from(s: String) -> Self {
        UserId(s)
    }
}

/// Unique identifier of a pull request (caller supplied, immutable)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PullRequestId(pub String);

impl PullRequestId {
    pub fn new(id: impl Into<String>) -> Self {
        PullRequestId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PullRequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for PullRequestId {
    fn from(s: &str) -> Self {
        PullRequestId(s.to_string())
    }
}

impl From<String> for PullRequestId {
    fn from(s: String) -> Self {
        PullRequestId(s)
    }
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// A team member. Membership lives here (`team_name`), never on the team.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub user_id: UserId,
    pub username: String,
    pub team_name: String,
    pub is_active: bool,
}

/// A team, identified by its name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub name: String,
}

impl Team {
    pub fn new(name: impl Into<String>) -> Self {
        Team { name: name.into() }
    }
}

/// Lifecycle status of a pull request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PullRequestStatus {
    Open,
    Merged,
}

impl PullRequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PullRequestStatus::Open => "OPEN",
            PullRequestStatus::Merged => "MERGED",
        }
    }
}

impl std::fmt::Display for PullRequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PullRequestStatus {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "OPEN" => Ok(PullRequestStatus::Open),
            "MERGED" => Ok(PullRequestStatus::Merged),
            other => Err(StorageError::Backend(format!(
                "unknown pull request status: {other}"
            ))),
        }
    }
}

/// Pull request lifecycle record.
///
/// Only `status` and `merged_at` change after creation; `merged_at` is set
/// exactly once, on the OPEN -> MERGED transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequest {
    pub pull_request_id: PullRequestId,
    pub name: String,
    pub author_id: UserId,
    pub status: PullRequestStatus,
    pub created_at: DateTime<Utc>,
    pub merged_at: Option<DateTime<Utc>>,
}

impl PullRequest {
    /// A freshly opened pull request stamped with the current time.
    pub fn open(
        pull_request_id: impl Into<PullRequestId>,
        name: impl Into<String>,
        author_id: impl Into<UserId>,
    ) -> Self {
        PullRequest {
            pull_request_id: pull_request_id.into(),
            name: name.into(),
            author_id: author_id.into(),
            status: PullRequestStatus::Open,
            created_at: Utc::now(),
            merged_at: None,
        }
    }

    pub fn is_merged(&self) -> bool {
        self.status == PullRequestStatus::Merged
    }

    /// Transition to MERGED at `at`. Returns `false` (and changes nothing)
    /// when the pull request is already merged.
    pub fn mark_merged(&mut self, at: DateTime<Utc>) -> bool {
        if self.is_merged() {
            return false;
        }
        self.status = PullRequestStatus::Merged;
        self.merged_at = Some(at);
        true
    }
}

/// Number of users per team
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamSize {
    pub team_name: String,
    pub user_count: u64,
}

/// Number of assignment edges per reviewer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewerLoad {
    pub user_id: UserId,
    pub assignments_count: u64,
}

// ---------------------------------------------------------------------------
// TeamDirectory
// ---------------------------------------------------------------------------

/// Team existence. Rosters are derived from the [`UserDirectory`].
#[async_trait]
pub trait TeamDirectory: Send + Sync {
    async fn team_exists(&self, name: &str) -> StorageResult<bool>;

    /// Persist a new team. Fails with `Duplicate` if the name is taken.
    async fn save_team(&self, team: &Team) -> StorageResult<()>;

    async fn get_team(&self, name: &str) -> StorageResult<Option<Team>>;

    async fn team_count(&self) -> StorageResult<u64>;
}

// ---------------------------------------------------------------------------
// UserDirectory
// ---------------------------------------------------------------------------

/// User profiles and reviewer-candidate queries.
///
/// Candidate queries share one eligibility rule: active, member of the given
/// team at query time, not excluded.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn get_user(&self, user_id: &UserId) -> StorageResult<Option<User>>;

    /// Persist a new user. Fails with `Duplicate` if the id is taken.
    async fn save_user(&self, user: &User) -> StorageResult<()>;

    /// Overwrite an existing user. Fails with `UserNotFound` if absent.
    async fn update_user(&self, user: &User) -> StorageResult<()>;

    async fn user_exists(&self, user_id: &UserId) -> StorageResult<bool>;

    async fn get_team_members(&self, team_name: &str) -> StorageResult<Vec<User>>;

    /// Up to `limit` active teammates of `author`, never the author.
    async fn choose_reviewers(&self, author: &User, limit: usize) -> StorageResult<Vec<UserId>>;

    /// One active member of `team_name` not contained in `exclude`.
    async fn reassign_reviewer(
        &self,
        team_name: &str,
        exclude: &[UserId],
    ) -> StorageResult<Option<UserId>>;

    async fn total_user_count(&self) -> StorageResult<u64>;

    async fn active_user_count(&self) -> StorageResult<u64>;

    async fn user_count_by_team(&self) -> StorageResult<Vec<TeamSize>>;
}

// ---------------------------------------------------------------------------
// AssignmentLedger
// ---------------------------------------------------------------------------

/// Many-to-many reviewer <-> pull request edges.
///
/// Guarantees:
/// - A `(user, pull request)` pair is stored at most once.
/// - `delete_assignment` of an absent pair is a no-op.
#[async_trait]
pub trait AssignmentLedger: Send + Sync {
    async fn assigned_pull_request_ids(&self, user_id: &UserId)
        -> StorageResult<Vec<PullRequestId>>;

    async fn assigned_reviewer_ids(&self, pull_request_id: &PullRequestId)
        -> StorageResult<Vec<UserId>>;

    /// Record an edge. Fails with `Duplicate` if the pair already exists.
    async fn create_assignment(
        &self,
        user_id: &UserId,
        pull_request_id: &PullRequestId,
    ) -> StorageResult<()>;

    async fn delete_assignment(
        &self,
        user_id: &UserId,
        pull_request_id: &PullRequestId,
    ) -> StorageResult<()>;

    /// Edge count per reviewer, for reviewers holding at least one edge.
    async fn assignment_counts(&self) -> StorageResult<Vec<ReviewerLoad>>;
}

// ---------------------------------------------------------------------------
// PullRequestStore
// ---------------------------------------------------------------------------

/// Pull request lifecycle records.
#[async_trait]
pub trait PullRequestStore: Send + Sync {
    async fn pull_request_exists(&self, pull_request_id: &PullRequestId) -> StorageResult<bool>;

    async fn get_pull_request(
        &self,
        pull_request_id: &PullRequestId,
    ) -> StorageResult<Option<PullRequest>>;

    /// Resolve many ids at once. Ids that do not resolve are skipped; the
    /// remaining records keep the input order.
    async fn get_pull_requests(&self, ids: &[PullRequestId]) -> StorageResult<Vec<PullRequest>>;

    /// Persist a new pull request. Fails with `Duplicate` if the id is taken.
    async fn save_pull_request(&self, pull_request: &PullRequest) -> StorageResult<()>;

    /// Overwrite an existing pull request. Fails with `PullRequestNotFound`
    /// if the row does not exist.
    async fn update_pull_request(&self, pull_request: &PullRequest) -> StorageResult<()>;

    async fn count_by_status(&self, status: PullRequestStatus) -> StorageResult<u64>;
}

// ---------------------------------------------------------------------------
// Stores: the collaborator bundle
// ---------------------------------------------------------------------------

/// Shared handles to the four collaborators.
///
/// Cloning is cheap; every clone talks to the same backend.
#[derive(Clone)]
pub struct Stores {
    pub teams: Arc<dyn TeamDirectory>,
    pub users: Arc<dyn UserDirectory>,
    pub assignments: Arc<dyn AssignmentLedger>,
    pub pull_requests: Arc<dyn PullRequestStore>,
}

impl Stores {
    /// Bundle a backend that implements all four collaborators.
    pub fn from_backend<B>(backend: Arc<B>) -> Self
    where
        B: TeamDirectory + UserDirectory + AssignmentLedger + PullRequestStore + 'static,
    {
        Stores {
            teams: backend.clone(),
            users: backend.clone(),
            assignments: backend.clone(),
            pull_requests: backend,
        }
    }
}

impl std::fmt::Debug for Stores {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stores").finish_non_exhaustive()
    }
}
