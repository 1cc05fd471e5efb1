//! Caller-facing views returned by the engine and flows.
//!
//! Field names match the JSON wire format of the HTTP API.

use chrono::{DateTime, Utc};
use revassign_state::{
    PullRequest, PullRequestId, PullRequestStatus, ReviewerLoad, TeamSize, User, UserId,
};
use serde::{Deserialize, Serialize};

/// A pull request together with its current reviewer list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestView {
    pub pull_request_id: PullRequestId,
    pub pull_request_name: String,
    pub author_id: UserId,
    pub status: PullRequestStatus,
    pub assigned_reviewers: Vec<UserId>,
    #[serde(
        rename = "createdAt",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(rename = "mergedAt", default, skip_serializing_if = "Option::is_none")]
    pub merged_at: Option<DateTime<Utc>>,
}

impl PullRequestView {
    pub fn new(pr: PullRequest, assigned_reviewers: Vec<UserId>) -> Self {
        PullRequestView {
            pull_request_id: pr.pull_request_id,
            pull_request_name: pr.name,
            author_id: pr.author_id,
            status: pr.status,
            assigned_reviewers,
            created_at: Some(pr.created_at),
            merged_at: pr.merged_at,
        }
    }
}

/// Result of a successful reassignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReassignOutcome {
    pub pr: PullRequestView,
    pub replaced_by: UserId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamMember {
    pub user_id: UserId,
    pub username: String,
    pub is_active: bool,
}

impl From<User> for TeamMember {
    fn from(user: User) -> Self {
        TeamMember {
            user_id: user.user_id,
            username: user.username,
            is_active: user.is_active,
        }
    }
}

/// A team and its members. Used both as roster submission and as view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamRoster {
    pub team_name: String,
    pub members: Vec<TeamMember>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserView {
    pub user_id: UserId,
    pub username: String,
    pub team_name: String,
    pub is_active: bool,
}

impl From<User> for UserView {
    fn from(user: User) -> Self {
        UserView {
            user_id: user.user_id,
            username: user.username,
            team_name: user.team_name,
            is_active: user.is_active,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestShort {
    pub pull_request_id: PullRequestId,
    pub pull_request_name: String,
    pub author_id: UserId,
    pub status: PullRequestStatus,
}

impl From<PullRequest> for PullRequestShort {
    fn from(pr: PullRequest) -> Self {
        PullRequestShort {
            pull_request_id: pr.pull_request_id,
            pull_request_name: pr.name,
            author_id: pr.author_id,
            status: pr.status,
        }
    }
}

/// Pull requests a user is currently assigned to review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignedPullRequests {
    pub user_id: UserId,
    pub pull_requests: Vec<PullRequestShort>,
}

/// Aggregate counts over the whole system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppStats {
    pub total_users_count: u64,
    pub active_users_count: u64,
    pub total_teams_count: u64,
    pub opened_pull_requests_count: u64,
    pub merged_pull_requests_count: u64,
    pub users_count_by_team: Vec<TeamSize>,
    pub assignments_count_by_user: Vec<ReviewerLoad>,
}
