//! Shared handler state.

use anyhow::{Context, Result};
use revassign_core::{
    AssignmentPolicy, ReviewerAssignmentEngine, StatsService, TeamService, UserService,
};
use revassign_state::{Stores, SurrealHandle};
use tracing::info;

use crate::config::{Backend, Config};

/// Everything a handler needs. Clones share the same backend.
#[derive(Clone)]
pub struct AppState {
    pub engine: ReviewerAssignmentEngine,
    pub teams: TeamService,
    pub users: UserService,
    pub stats: StatsService,
    pub backend: &'static str,
}

impl AppState {
    pub fn new(stores: Stores, policy: AssignmentPolicy, backend: Backend) -> Self {
        Self {
            engine: ReviewerAssignmentEngine::with_policy(stores.clone(), policy),
            teams: TeamService::new(stores.clone()),
            users: UserService::new(stores.clone()),
            stats: StatsService::new(stores),
            backend: backend.as_str(),
        }
    }

    /// Fresh in-memory state with the default policy.
    pub fn in_memory() -> Self {
        Self::new(
            Stores::in_memory(),
            AssignmentPolicy::default(),
            Backend::Memory,
        )
    }

    /// Connect the configured backend and wire the services to it.
    pub async fn from_config(config: &Config) -> Result<Self> {
        let policy = config.policy()?;
        let stores = match config.backend {
            Backend::Memory => Stores::in_memory(),
            Backend::Surreal => {
                let handle = SurrealHandle::from_env()
                    .await
                    .context("Failed to connect to SurrealDB")?;
                Stores::surreal(&handle)
            }
        };
        info!(
            backend = config.backend.as_str(),
            max_reviewers = policy.max_reviewers,
            "storage ready"
        );
        Ok(Self::new(stores, policy, config.backend))
    }
}
