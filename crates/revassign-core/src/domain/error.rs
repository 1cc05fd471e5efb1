//! Domain-level error taxonomy for reviewer assignment.

use revassign_state::StorageError;
use serde::{Deserialize, Serialize};

/// Stable machine-readable error codes, as they appear on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCode {
    #[serde(rename = "NOT_FOUND")]
    NotFound,
    #[serde(rename = "TEAM_EXISTS")]
    TeamExists,
    #[serde(rename = "PR_EXISTS")]
    PrExists,
    #[serde(rename = "PR_MERGED")]
    PrMerged,
    #[serde(rename = "NOT_ASSIGNED")]
    NotAssigned,
    #[serde(rename = "NO_CANDIDATE")]
    NoCandidate,
    #[serde(rename = "INVALID_INPUT")]
    InvalidInput,
    #[serde(rename = "INTERNAL_ERROR")]
    Internal,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::TeamExists => "TEAM_EXISTS",
            ErrorCode::PrExists => "PR_EXISTS",
            ErrorCode::PrMerged => "PR_MERGED",
            ErrorCode::NotAssigned => "NOT_ASSIGNED",
            ErrorCode::NoCandidate => "NO_CANDIDATE",
            ErrorCode::InvalidInput => "INVALID_INPUT",
            ErrorCode::Internal => "INTERNAL_ERROR",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors surfaced by the engine and the team/user/stats flows.
#[derive(Debug, thiserror::Error)]
pub enum AssignmentError {
    #[error("{resource} not found: {id}")]
    NotFound { resource: &'static str, id: String },

    #[error("team {team_name} already exists")]
    TeamExists { team_name: String },

    #[error("pull request {pull_request_id} already exists")]
    PrExists { pull_request_id: String },

    #[error("cannot reassign on merged PR")]
    PrMerged,

    #[error("reviewer is not assigned to this PR")]
    NotAssigned,

    #[error("no active replacement candidate in team")]
    NoCandidate,

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("internal error: {0}")]
    Storage(#[from] StorageError),
}

impl AssignmentError {
    pub fn user_not_found(id: impl std::fmt::Display) -> Self {
        AssignmentError::NotFound {
            resource: "user",
            id: id.to_string(),
        }
    }

    pub fn team_not_found(name: impl std::fmt::Display) -> Self {
        AssignmentError::NotFound {
            resource: "team",
            id: name.to_string(),
        }
    }

    pub fn pull_request_not_found(id: impl std::fmt::Display) -> Self {
        AssignmentError::NotFound {
            resource: "pull request",
            id: id.to_string(),
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            AssignmentError::NotFound { .. } => ErrorCode::NotFound,
            AssignmentError::TeamExists { .. } => ErrorCode::TeamExists,
            AssignmentError::PrExists { .. } => ErrorCode::PrExists,
            AssignmentError::PrMerged => ErrorCode::PrMerged,
            AssignmentError::NotAssigned => ErrorCode::NotAssigned,
            AssignmentError::NoCandidate => ErrorCode::NoCandidate,
            AssignmentError::InvalidInput(_) => ErrorCode::InvalidInput,
            AssignmentError::Storage(_) => ErrorCode::Internal,
        }
    }
}

/// Result type for reviewer assignment operations.
pub type Result<T> = std::result::Result<T, AssignmentError>;
