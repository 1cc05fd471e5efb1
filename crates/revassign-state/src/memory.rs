//! In-memory backend for the storage traits
//!
//! `MemoryStore` keeps every table behind one `Mutex`, so each trait call is
//! a single critical section. Candidate selection is deterministic (ordered
//! by user id), which keeps tests reproducible.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use tracing::debug;

use crate::error::StorageError;
use crate::storage_traits::*;

#[derive(Debug, Default)]
struct MemoryTables {
    teams: BTreeMap<String, Team>,
    users: BTreeMap<UserId, User>,
    pull_requests: HashMap<PullRequestId, PullRequest>,
    assignments: BTreeSet<(UserId, PullRequestId)>,
}

impl MemoryTables {
    fn eligible<'a>(
        &'a self,
        team_name: &'a str,
        exclude: &'a [UserId],
    ) -> impl Iterator<Item = &'a User> + 'a {
        self.users.values().filter(move |u| {
            u.is_active && u.team_name == team_name && !exclude.contains(&u.user_id)
        })
    }
}

/// All four collaborators over one lock-guarded set of tables.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<MemoryTables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> StorageResult<MutexGuard<'_, MemoryTables>> {
        self.tables
            .lock()
            .map_err(|e| StorageError::Backend(format!("memory store lock poisoned: {e}")))
    }
}

impl Stores {
    /// Bundle backed by a fresh [`MemoryStore`].
    pub fn in_memory() -> Self {
        Stores::from_backend(Arc::new(MemoryStore::new()))
    }
}

// ---------------------------------------------------------------------------
// TeamDirectory
// ---------------------------------------------------------------------------

#[async_trait]
impl TeamDirectory for MemoryStore {
    async fn team_exists(&self, name: &str) -> StorageResult<bool> {
        Ok(self.lock()?.teams.contains_key(name))
    }

    async fn save_team(&self, team: &Team) -> StorageResult<()> {
        let mut tables = self.lock()?;
        if tables.teams.contains_key(&team.name) {
            return Err(StorageError::Duplicate {
                kind: "team",
                id: team.name.clone(),
            });
        }
        tables.teams.insert(team.name.clone(), team.clone());
        debug!(team = %team.name, "team saved");
        Ok(())
    }

    async fn get_team(&self, name: &str) -> StorageResult<Option<Team>> {
        Ok(self.lock()?.teams.get(name).cloned())
    }

    async fn team_count(&self) -> StorageResult<u64> {
        Ok(self.lock()?.teams.len() as u64)
    }
}

// ---------------------------------------------------------------------------
// UserDirectory
// ---------------------------------------------------------------------------

#[async_trait]
impl UserDirectory for MemoryStore {
    async fn get_user(&self, user_id: &UserId) -> StorageResult<Option<User>> {
        Ok(self.lock()?.users.get(user_id).cloned())
    }

    async fn save_user(&self, user: &User) -> StorageResult<()> {
        let mut tables = self.lock()?;
        if tables.users.contains_key(&user.user_id) {
            return Err(StorageError::Duplicate {
                kind: "user",
                id: user.user_id.to_string(),
            });
        }
        tables.users.insert(user.user_id.clone(), user.clone());
        Ok(())
    }

    async fn update_user(&self, user: &User) -> StorageResult<()> {
        let mut tables = self.lock()?;
        match tables.users.get_mut(&user.user_id) {
            Some(existing) => {
                *existing = user.clone();
                Ok(())
            }
            None => Err(StorageError::UserNotFound {
                user_id: user.user_id.to_string(),
            }),
        }
    }

    async fn user_exists(&self, user_id: &UserId) -> StorageResult<bool> {
        Ok(self.lock()?.users.contains_key(user_id))
    }

    async fn get_team_members(&self, team_name: &str) -> StorageResult<Vec<User>> {
        let tables = self.lock()?;
        Ok(tables
            .users
            .values()
            .filter(|u| u.team_name == team_name)
            .cloned()
            .collect())
    }

    async fn choose_reviewers(&self, author: &User, limit: usize) -> StorageResult<Vec<UserId>> {
        let tables = self.lock()?;
        let exclude = [author.user_id.clone()];
        let picked: Vec<UserId> = tables
            .eligible(&author.team_name, &exclude)
            .take(limit)
            .map(|u| u.user_id.clone())
            .collect();
        Ok(picked)
    }

    async fn reassign_reviewer(
        &self,
        team_name: &str,
        exclude: &[UserId],
    ) -> StorageResult<Option<UserId>> {
        let tables = self.lock()?;
        let picked = tables
            .eligible(team_name, exclude)
            .next()
            .map(|u| u.user_id.clone());
        Ok(picked)
    }

    async fn total_user_count(&self) -> StorageResult<u64> {
        Ok(self.lock()?.users.len() as u64)
    }

    async fn active_user_count(&self) -> StorageResult<u64> {
        Ok(self.lock()?.users.values().filter(|u| u.is_active).count() as u64)
    }

    async fn user_count_by_team(&self) -> StorageResult<Vec<TeamSize>> {
        let tables = self.lock()?;
        let mut counts: BTreeMap<&str, u64> = BTreeMap::new();
        for user in tables.users.values() {
            *counts.entry(user.team_name.as_str()).or_default() += 1;
        }
        Ok(counts
            .into_iter()
            .map(|(team_name, user_count)| TeamSize {
                team_name: team_name.to_string(),
                user_count,
            })
            .collect())
    }
}

// ---------------------------------------------------------------------------
// AssignmentLedger
// ---------------------------------------------------------------------------

#[async_trait]
impl AssignmentLedger for MemoryStore {
    async fn assigned_pull_request_ids(
        &self,
        user_id: &UserId,
    ) -> StorageResult<Vec<PullRequestId>> {
        let tables = self.lock()?;
        Ok(tables
            .assignments
            .iter()
            .filter(|(u, _)| u == user_id)
            .map(|(_, pr)| pr.clone())
            .collect())
    }

    async fn assigned_reviewer_ids(
        &self,
        pull_request_id: &PullRequestId,
    ) -> StorageResult<Vec<UserId>> {
        let tables = self.lock()?;
        Ok(tables
            .assignments
            .iter()
            .filter(|(_, pr)| pr == pull_request_id)
            .map(|(u, _)| u.clone())
            .collect())
    }

    async fn create_assignment(
        &self,
        user_id: &UserId,
        pull_request_id: &PullRequestId,
    ) -> StorageResult<()> {
        let mut tables = self.lock()?;
        if !tables
            .assignments
            .insert((user_id.clone(), pull_request_id.clone()))
        {
            return Err(StorageError::Duplicate {
                kind: "assignment",
                id: format!("{user_id}:{pull_request_id}"),
            });
        }
        Ok(())
    }

    async fn delete_assignment(
        &self,
        user_id: &UserId,
        pull_request_id: &PullRequestId,
    ) -> StorageResult<()> {
        let mut tables = self.lock()?;
        tables
            .assignments
            .remove(&(user_id.clone(), pull_request_id.clone()));
        Ok(())
    }

    async fn assignment_counts(&self) -> StorageResult<Vec<ReviewerLoad>> {
        let tables = self.lock()?;
        let mut counts: BTreeMap<&UserId, u64> = BTreeMap::new();
        for (user_id, _) in &tables.assignments {
            *counts.entry(user_id).or_default() += 1;
        }
        Ok(counts
            .into_iter()
            .map(|(user_id, assignments_count)| ReviewerLoad {
                user_id: user_id.clone(),
                assignments_count,
            })
            .collect())
    }
}

// ---------------------------------------------------------------------------
// PullRequestStore
// ---------------------------------------------------------------------------

#[async_trait]
impl PullRequestStore for MemoryStore {
    async fn pull_request_exists(&self, pull_request_id: &PullRequestId) -> StorageResult<bool> {
        Ok(self.lock()?.pull_requests.contains_key(pull_request_id))
    }

    async fn get_pull_request(
        &self,
        pull_request_id: &PullRequestId,
    ) -> StorageResult<Option<PullRequest>> {
        Ok(self.lock()?.pull_requests.get(pull_request_id).cloned())
    }

    async fn get_pull_requests(&self, ids: &[PullRequestId]) -> StorageResult<Vec<PullRequest>> {
        let tables = self.lock()?;
        Ok(ids
            .iter()
            .filter_map(|id| tables.pull_requests.get(id).cloned())
            .collect())
    }

    async fn save_pull_request(&self, pull_request: &PullRequest) -> StorageResult<()> {
        let mut tables = self.lock()?;
        if tables
            .pull_requests
            .contains_key(&pull_request.pull_request_id)
        {
            return Err(StorageError::Duplicate {
                kind: "pull request",
                id: pull_request.pull_request_id.to_string(),
            });
        }
        tables
            .pull_requests
            .insert(pull_request.pull_request_id.clone(), pull_request.clone());
        Ok(())
    }

    async fn update_pull_request(&self, pull_request: &PullRequest) -> StorageResult<()> {
        let mut tables = self.lock()?;
        match tables.pull_requests.get_mut(&pull_request.pull_request_id) {
            Some(existing) => {
                *existing = pull_request.clone();
                Ok(())
            }
            None => Err(StorageError::PullRequestNotFound {
                pull_request_id: pull_request.pull_request_id.to_string(),
            }),
        }
    }

    async fn count_by_status(&self, status: PullRequestStatus) -> StorageResult<u64> {
        let tables = self.lock()?;
        Ok(tables
            .pull_requests
            .values()
            .filter(|pr| pr.status == status)
            .count() as u64)
    }
}
