//! SurrealDB-backed implementation of the four storage traits
//!
//! Uses the row types in [`crate::schema`] for persistence, converting to and
//! from `storage_traits` types at the boundary. Reviewer candidates are
//! drawn with `ORDER BY rand()` so review load spreads across the team.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use surrealdb::engine::any::Any;
use surrealdb::Surreal;
use tracing::{debug, instrument};

use crate::error::StorageError;
use crate::handle::SurrealHandle;
use crate::schema::{
    AssignmentRow, CountRow, PullRequestRow, ReviewerLoadRow, TeamRow, TeamSizeRow, UserRow,
};
use crate::storage_traits::*;

const USER_FIELDS: &str = "user_id, username, team_name, is_active";
const PULL_REQUEST_FIELDS: &str =
    "pull_request_id, pull_request_name, author_id, status, created_at, merged_at";

/// All four collaborators over one SurrealDB connection.
#[derive(Clone)]
pub struct SurrealStore {
    db: Surreal<Any>,
}

impl SurrealStore {
    pub fn new(handle: &SurrealHandle) -> Self {
        Self {
            db: handle.db().clone(),
        }
    }

    /// Connect to `mem://` and build a store, for tests.
    pub async fn in_memory() -> crate::Result<Self> {
        let handle = SurrealHandle::in_memory().await?;
        Ok(Self::new(&handle))
    }

    // -- private helpers -----------------------------------------------------

    /// Run a single-statement query with string bindings and take its rows.
    async fn select<T: DeserializeOwned>(
        &self,
        sql: &str,
        binds: Vec<(&'static str, String)>,
    ) -> StorageResult<Vec<T>> {
        let mut query = self.db.query(sql);
        for bind in binds {
            query = query.bind(bind);
        }
        let mut res = query.await?;
        let rows: Vec<T> = res.take(0)?;
        Ok(rows)
    }

    /// `count() ... GROUP ALL` yields no row at all for an empty match.
    async fn count(&self, sql: &str, binds: Vec<(&'static str, String)>) -> StorageResult<u64> {
        let rows: Vec<CountRow> = self.select(sql, binds).await?;
        Ok(rows.first().map(|r| r.count).unwrap_or(0))
    }

    async fn fetch_user(&self, user_id: &str) -> StorageResult<Option<UserRow>> {
        let rows: Vec<UserRow> = self
            .select(
                &format!("SELECT {USER_FIELDS} FROM users WHERE user_id = $uid LIMIT 1"),
                vec![("uid", user_id.to_string())],
            )
            .await?;
        Ok(rows.into_iter().next())
    }

    /// `CREATE` one row. The existence check before it can lose a race, in
    /// which case the unique index rejects the row; that is a `Duplicate`.
    async fn create_row<T>(
        &self,
        table: &'static str,
        row: T,
        kind: &'static str,
        id: String,
    ) -> StorageResult<()>
    where
        T: Serialize + Send + 'static,
    {
        let outcome = async {
            self.db
                .query(format!("CREATE {table} CONTENT $row RETURN NONE"))
                .bind(("row", row))
                .await?
                .check()?;
            Ok::<(), surrealdb::Error>(())
        }
        .await;
        outcome.map_err(|e| {
            if is_unique_violation(&e) {
                debug!(table, %id, "unique index rejected row");
                StorageError::Duplicate { kind, id }
            } else {
                e.into()
            }
        })
    }

    async fn fetch_pull_request(&self, pr_id: &str) -> StorageResult<Option<PullRequestRow>> {
        let rows: Vec<PullRequestRow> = self
            .select(
                &format!(
                    "SELECT {PULL_REQUEST_FIELDS} FROM pull_requests WHERE pull_request_id = $prid LIMIT 1"
                ),
                vec![("prid", pr_id.to_string())],
            )
            .await?;
        Ok(rows.into_iter().next())
    }
}

/// Index violations read "Database index `idx` already contains ...".
fn is_unique_violation(err: &surrealdb::Error) -> bool {
    err.to_string().contains("already contains")
}

impl Stores {
    /// Bundle backed by a [`SurrealStore`] on `handle`.
    pub fn surreal(handle: &SurrealHandle) -> Self {
        Stores::from_backend(Arc::new(SurrealStore::new(handle)))
    }
}

// ---------------------------------------------------------------------------
// TeamDirectory
// ---------------------------------------------------------------------------

#[async_trait]
impl TeamDirectory for SurrealStore {
    async fn team_exists(&self, name: &str) -> StorageResult<bool> {
        Ok(self.get_team(name).await?.is_some())
    }

    #[instrument(skip(self, team), fields(team = %team.name))]
    async fn save_team(&self, team: &Team) -> StorageResult<()> {
        if self.team_exists(&team.name).await? {
            return Err(StorageError::Duplicate {
                kind: "team",
                id: team.name.clone(),
            });
        }
        debug!("creating team");
        self.create_row("teams", TeamRow::from(team), "team", team.name.clone())
            .await
    }

    async fn get_team(&self, name: &str) -> StorageResult<Option<Team>> {
        let rows: Vec<TeamRow> = self
            .select(
                "SELECT name FROM teams WHERE name = $name LIMIT 1",
                vec![("name", name.to_string())],
            )
            .await?;
        Ok(rows.into_iter().next().map(Team::from))
    }

    async fn team_count(&self) -> StorageResult<u64> {
        self.count("SELECT count() AS count FROM teams GROUP ALL", vec![])
            .await
    }
}

// ---------------------------------------------------------------------------
// UserDirectory
// ---------------------------------------------------------------------------

#[async_trait]
impl UserDirectory for SurrealStore {
    async fn get_user(&self, user_id: &UserId) -> StorageResult<Option<User>> {
        Ok(self.fetch_user(user_id.as_str()).await?.map(User::from))
    }

    #[instrument(skip(self, user), fields(user_id = %user.user_id))]
    async fn save_user(&self, user: &User) -> StorageResult<()> {
        if self.fetch_user(user.user_id.as_str()).await?.is_some() {
            return Err(StorageError::Duplicate {
                kind: "user",
                id: user.user_id.to_string(),
            });
        }
        debug!("creating user");
        self.create_row("users", UserRow::from(user), "user", user.user_id.to_string())
            .await
    }

    #[instrument(skip(self, user), fields(user_id = %user.user_id))]
    async fn update_user(&self, user: &User) -> StorageResult<()> {
        if self.fetch_user(user.user_id.as_str()).await?.is_none() {
            return Err(StorageError::UserNotFound {
                user_id: user.user_id.to_string(),
            });
        }
        debug!("updating user");
        self.db
            .query("UPDATE users CONTENT $row WHERE user_id = $uid RETURN NONE")
            .bind(("row", UserRow::from(user)))
            .bind(("uid", user.user_id.0.clone()))
            .await?
            .check()?;
        Ok(())
    }

    async fn user_exists(&self, user_id: &UserId) -> StorageResult<bool> {
        Ok(self.fetch_user(user_id.as_str()).await?.is_some())
    }

    async fn get_team_members(&self, team_name: &str) -> StorageResult<Vec<User>> {
        let rows: Vec<UserRow> = self
            .select(
                &format!(
                    "SELECT {USER_FIELDS} FROM users WHERE team_name = $team ORDER BY user_id"
                ),
                vec![("team", team_name.to_string())],
            )
            .await?;
        Ok(rows.into_iter().map(User::from).collect())
    }

    #[instrument(skip(self, author), fields(author = %author.user_id, team = %author.team_name))]
    async fn choose_reviewers(&self, author: &User, limit: usize) -> StorageResult<Vec<UserId>> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let ids: Vec<String> = self
            .select(
                &format!(
                    "SELECT VALUE user_id FROM users \
                     WHERE team_name = $team AND is_active = true AND user_id != $author \
                     ORDER BY rand() LIMIT {limit}"
                ),
                vec![
                    ("team", author.team_name.clone()),
                    ("author", author.user_id.0.clone()),
                ],
            )
            .await?;
        debug!(count = ids.len(), "reviewer candidates chosen");
        Ok(ids.into_iter().map(UserId).collect())
    }

    #[instrument(skip(self, exclude), fields(team = %team_name, excluded = exclude.len()))]
    async fn reassign_reviewer(
        &self,
        team_name: &str,
        exclude: &[UserId],
    ) -> StorageResult<Option<UserId>> {
        let excluded: Vec<String> = exclude.iter().map(|u| u.0.clone()).collect();
        let mut res = self
            .db
            .query(
                "SELECT VALUE user_id FROM users \
                 WHERE team_name = $team AND is_active = true AND user_id NOTINSIDE $exclude \
                 ORDER BY rand() LIMIT 1",
            )
            .bind(("team", team_name.to_string()))
            .bind(("exclude", excluded))
            .await?;
        let ids: Vec<String> = res.take(0)?;
        Ok(ids.into_iter().next().map(UserId))
    }

    async fn total_user_count(&self) -> StorageResult<u64> {
        self.count("SELECT count() AS count FROM users GROUP ALL", vec![])
            .await
    }

    async fn active_user_count(&self) -> StorageResult<u64> {
        self.count(
            "SELECT count() AS count FROM users WHERE is_active = true GROUP ALL",
            vec![],
        )
        .await
    }

    async fn user_count_by_team(&self) -> StorageResult<Vec<TeamSize>> {
        let rows: Vec<TeamSizeRow> = self
            .select(
                "SELECT team_name, count() AS user_count FROM users GROUP BY team_name",
                vec![],
            )
            .await?;
        let mut sizes: Vec<TeamSize> = rows
            .into_iter()
            .map(|r| TeamSize {
                team_name: r.team_name,
                user_count: r.user_count,
            })
            .collect();
        sizes.sort_by(|a, b| a.team_name.cmp(&b.team_name));
        Ok(sizes)
    }
}

// ---------------------------------------------------------------------------
// AssignmentLedger
// ---------------------------------------------------------------------------

#[async_trait]
impl AssignmentLedger for SurrealStore {
    async fn assigned_pull_request_ids(
        &self,
        user_id: &UserId,
    ) -> StorageResult<Vec<PullRequestId>> {
        let mut ids: Vec<String> = self
            .select(
                "SELECT VALUE pull_request_id FROM assigned_reviewers WHERE user_id = $uid",
                vec![("uid", user_id.0.clone())],
            )
            .await?;
        ids.sort();
        Ok(ids.into_iter().map(PullRequestId).collect())
    }

    async fn assigned_reviewer_ids(
        &self,
        pull_request_id: &PullRequestId,
    ) -> StorageResult<Vec<UserId>> {
        let mut ids: Vec<String> = self
            .select(
                "SELECT VALUE user_id FROM assigned_reviewers WHERE pull_request_id = $prid",
                vec![("prid", pull_request_id.0.clone())],
            )
            .await?;
        ids.sort();
        Ok(ids.into_iter().map(UserId).collect())
    }

    #[instrument(skip(self), fields(user_id = %user_id, pull_request_id = %pull_request_id))]
    async fn create_assignment(
        &self,
        user_id: &UserId,
        pull_request_id: &PullRequestId,
    ) -> StorageResult<()> {
        let existing = self
            .count(
                "SELECT count() AS count FROM assigned_reviewers \
                 WHERE user_id = $uid AND pull_request_id = $prid GROUP ALL",
                vec![
                    ("uid", user_id.0.clone()),
                    ("prid", pull_request_id.0.clone()),
                ],
            )
            .await?;
        if existing > 0 {
            return Err(StorageError::Duplicate {
                kind: "assignment",
                id: format!("{user_id}:{pull_request_id}"),
            });
        }
        debug!("creating assignment");
        self.create_row(
            "assigned_reviewers",
            AssignmentRow::new(user_id, pull_request_id),
            "assignment",
            format!("{user_id}:{pull_request_id}"),
        )
        .await
    }

    #[instrument(skip(self), fields(user_id = %user_id, pull_request_id = %pull_request_id))]
    async fn delete_assignment(
        &self,
        user_id: &UserId,
        pull_request_id: &PullRequestId,
    ) -> StorageResult<()> {
        debug!("deleting assignment");
        self.db
            .query("DELETE assigned_reviewers WHERE user_id = $uid AND pull_request_id = $prid")
            .bind(("uid", user_id.0.clone()))
            .bind(("prid", pull_request_id.0.clone()))
            .await?
            .check()?;
        Ok(())
    }

    async fn assignment_counts(&self) -> StorageResult<Vec<ReviewerLoad>> {
        let rows: Vec<ReviewerLoadRow> = self
            .select(
                "SELECT user_id, count() AS assignments_count FROM assigned_reviewers GROUP BY user_id",
                vec![],
            )
            .await?;
        let mut loads: Vec<ReviewerLoad> = rows
            .into_iter()
            .map(|r| ReviewerLoad {
                user_id: UserId(r.user_id),
                assignments_count: r.assignments_count,
            })
            .collect();
        loads.sort_by(|a, b| a.user_id.cmp(&b.user_id));
        Ok(loads)
    }
}

// ---------------------------------------------------------------------------
// PullRequestStore
// ---------------------------------------------------------------------------

#[async_trait]
impl PullRequestStore for SurrealStore {
    async fn pull_request_exists(&self, pull_request_id: &PullRequestId) -> StorageResult<bool> {
        Ok(self
            .fetch_pull_request(pull_request_id.as_str())
            .await?
            .is_some())
    }

    async fn get_pull_request(
        &self,
        pull_request_id: &PullRequestId,
    ) -> StorageResult<Option<PullRequest>> {
        self.fetch_pull_request(pull_request_id.as_str())
            .await?
            .map(PullRequestRow::into_pull_request)
            .transpose()
    }

    async fn get_pull_requests(&self, ids: &[PullRequestId]) -> StorageResult<Vec<PullRequest>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let wanted: Vec<String> = ids.iter().map(|id| id.0.clone()).collect();
        let mut res = self
            .db
            .query(format!(
                "SELECT {PULL_REQUEST_FIELDS} FROM pull_requests WHERE pull_request_id INSIDE $ids"
            ))
            .bind(("ids", wanted))
            .await?;
        let rows: Vec<PullRequestRow> = res.take(0)?;

        let mut by_id: HashMap<String, PullRequestRow> = rows
            .into_iter()
            .map(|row| (row.pull_request_id.clone(), row))
            .collect();
        ids.iter()
            .filter_map(|id| by_id.remove(id.as_str()))
            .map(PullRequestRow::into_pull_request)
            .collect()
    }

    #[instrument(skip(self, pull_request), fields(pull_request_id = %pull_request.pull_request_id))]
    async fn save_pull_request(&self, pull_request: &PullRequest) -> StorageResult<()> {
        if self
            .fetch_pull_request(pull_request.pull_request_id.as_str())
            .await?
            .is_some()
        {
            return Err(StorageError::Duplicate {
                kind: "pull request",
                id: pull_request.pull_request_id.to_string(),
            });
        }
        debug!("creating pull request");
        self.create_row(
            "pull_requests",
            PullRequestRow::from(pull_request),
            "pull request",
            pull_request.pull_request_id.to_string(),
        )
        .await
    }

    #[instrument(skip(self, pull_request), fields(pull_request_id = %pull_request.pull_request_id, status = %pull_request.status))]
    async fn update_pull_request(&self, pull_request: &PullRequest) -> StorageResult<()> {
        if self
            .fetch_pull_request(pull_request.pull_request_id.as_str())
            .await?
            .is_none()
        {
            return Err(StorageError::PullRequestNotFound {
                pull_request_id: pull_request.pull_request_id.to_string(),
            });
        }
        debug!("updating pull request");
        self.db
            .query("UPDATE pull_requests CONTENT $row WHERE pull_request_id = $prid RETURN NONE")
            .bind(("row", PullRequestRow::from(pull_request)))
            .bind(("prid", pull_request.pull_request_id.0.clone()))
            .await?
            .check()?;
        Ok(())
    }

    async fn count_by_status(&self, status: PullRequestStatus) -> StorageResult<u64> {
        self.count(
            "SELECT count() AS count FROM pull_requests WHERE status = $status GROUP ALL",
            vec![("status", status.as_str().to_string())],
        )
        .await
    }
}
