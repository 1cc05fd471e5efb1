//! Row definitions for the revassign SurrealDB tables
//!
//! Tables:
//! - users: user profiles, team membership lives here
//! - teams: team names
//! - pull_requests: pull request lifecycle records
//! - assigned_reviewers: reviewer <-> pull request edges
//!
//! Rows are the persisted shape; [`crate::storage_traits`] types are the
//! shape the rest of the workspace sees. Conversion happens at the boundary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::storage_traits::{
    PullRequest, PullRequestId, PullRequestStatus, StorageResult, Team, User, UserId,
};

/// Module for serializing chrono DateTime to SurrealDB datetime format
mod surreal_datetime {
    use chrono::{DateTime, Utc};
    use serde::{self, Deserialize, Deserializer, Serializer};
    use surrealdb::sql::Datetime as SurrealDatetime;

    pub fn serialize<S>(date: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let sd = SurrealDatetime::from(*date);
        serde::Serialize::serialize(&sd, serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let sd = SurrealDatetime::deserialize(deserializer)?;
        Ok(DateTime::from(sd))
    }
}

/// Module for serializing optional chrono DateTime to SurrealDB datetime format
mod surreal_datetime_opt {
    use chrono::{DateTime, Utc};
    use serde::{self, Deserialize, Deserializer, Serializer};
    use surrealdb::sql::Datetime as SurrealDatetime;

    pub fn serialize<S>(date: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match date {
            Some(d) => {
                let sd = SurrealDatetime::from(*d);
                serde::Serialize::serialize(&Some(sd), serializer)
            }
            None => serde::Serialize::serialize(&None::<SurrealDatetime>, serializer),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let sd = Option::<SurrealDatetime>::deserialize(deserializer)?;
        Ok(sd.map(DateTime::from))
    }
}

/// User row stored in SurrealDB
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRow {
    /// SurrealDB record ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<surrealdb::sql::Thing>,
    pub user_id: String,
    pub username: String,
    pub team_name: String,
    pub is_active: bool,
}

impl From<&User> for UserRow {
    fn from(user: &User) -> Self {
        UserRow {
            id: None,
            user_id: user.user_id.0.clone(),
            username: user.username.clone(),
            team_name: user.team_name.clone(),
            is_active: user.is_active,
        }
    }
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            user_id: UserId(row.user_id),
            username: row.username,
            team_name: row.team_name,
            is_active: row.is_active,
        }
    }
}

/// Team row stored in SurrealDB
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamRow {
    /// SurrealDB record ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<surrealdb::sql::Thing>,
    pub name: String,
}

impl From<&Team> for TeamRow {
    fn from(team: &Team) -> Self {
        TeamRow {
            id: None,
            name: team.name.clone(),
        }
    }
}

impl From<TeamRow> for Team {
    fn from(row: TeamRow) -> Self {
        Team { name: row.name }
    }
}

/// Pull request row stored in SurrealDB
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullRequestRow {
    /// SurrealDB record ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<surrealdb::sql::Thing>,
    pub pull_request_id: String,
    pub pull_request_name: String,
    pub author_id: String,
    /// "OPEN" | "MERGED"
    pub status: String,
    #[serde(with = "surreal_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(default, with = "surreal_datetime_opt")]
    pub merged_at: Option<DateTime<Utc>>,
}

impl From<&PullRequest> for PullRequestRow {
    fn from(pr: &PullRequest) -> Self {
        PullRequestRow {
            id: None,
            pull_request_id: pr.pull_request_id.0.clone(),
            pull_request_name: pr.name.clone(),
            author_id: pr.author_id.0.clone(),
            status: pr.status.as_str().to_string(),
            created_at: pr.created_at,
            merged_at: pr.merged_at,
        }
    }
}

impl PullRequestRow {
    /// Convert into the trait-level record; fails on an unknown status.
    pub fn into_pull_request(self) -> StorageResult<PullRequest> {
        let status: PullRequestStatus = self.status.parse()?;
        Ok(PullRequest {
            pull_request_id: PullRequestId(self.pull_request_id),
            name: self.pull_request_name,
            author_id: UserId(self.author_id),
            status,
            created_at: self.created_at,
            merged_at: self.merged_at,
        })
    }
}

/// Reviewer assignment edge stored in SurrealDB
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignmentRow {
    /// SurrealDB record ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<surrealdb::sql::Thing>,
    pub user_id: String,
    pub pull_request_id: String,
}

impl AssignmentRow {
    pub fn new(user_id: &UserId, pull_request_id: &PullRequestId) -> Self {
        AssignmentRow {
            id: None,
            user_id: user_id.0.clone(),
            pull_request_id: pull_request_id.0.clone(),
        }
    }
}

/// Result row of a `count() ... GROUP ALL` query
#[derive(Debug, Clone, Deserialize)]
pub struct CountRow {
    pub count: u64,
}

/// Result row of the per-team user count
#[derive(Debug, Clone, Deserialize)]
pub struct TeamSizeRow {
    pub team_name: String,
    pub user_count: u64,
}

/// Result row of the per-reviewer assignment count
#[derive(Debug, Clone, Deserialize)]
pub struct ReviewerLoadRow {
    pub user_id: String,
    pub assignments_count: u64,
}
