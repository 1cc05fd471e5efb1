//! Read-only aggregate counts.

use revassign_state::{PullRequestStatus, Stores};
use tracing::instrument;

use crate::domain::{AppStats, Result};

#[derive(Clone)]
pub struct StatsService {
    stores: Stores,
}

impl StatsService {
    pub fn new(stores: Stores) -> Self {
        Self { stores }
    }

    /// Counts are read one after another, not from a single snapshot.
    #[instrument(skip(self))]
    pub async fn collect(&self) -> Result<AppStats> {
        let stores = &self.stores;
        Ok(AppStats {
            total_users_count: stores.users.total_user_count().await?,
            active_users_count: stores.users.active_user_count().await?,
            total_teams_count: stores.teams.team_count().await?,
            opened_pull_requests_count: stores
                .pull_requests
                .count_by_status(PullRequestStatus::Open)
                .await?,
            merged_pull_requests_count: stores
                .pull_requests
                .count_by_status(PullRequestStatus::Merged)
                .await?,
            users_count_by_team: stores.users.user_count_by_team().await?,
            assignments_count_by_user: stores.assignments.assignment_counts().await?,
        })
    }
}
