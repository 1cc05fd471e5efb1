//! User availability and review queue flows.

use revassign_state::{StorageError, Stores, UserId};
use tracing::instrument;

use crate::domain::{AssignedPullRequests, AssignmentError, PullRequestShort, Result, UserView};
use crate::obs;

#[derive(Clone)]
pub struct UserService {
    stores: Stores,
}

impl UserService {
    pub fn new(stores: Stores) -> Self {
        Self { stores }
    }

    /// Toggle whether a user may be picked as reviewer. Existing
    /// assignments are left alone.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn set_is_active(&self, user_id: &UserId, is_active: bool) -> Result<UserView> {
        let mut user = self
            .stores
            .users
            .get_user(user_id)
            .await?
            .ok_or_else(|| AssignmentError::user_not_found(user_id))?;

        user.is_active = is_active;
        self.stores
            .users
            .update_user(&user)
            .await
            .map_err(|e| match e {
                StorageError::UserNotFound { user_id } => AssignmentError::user_not_found(user_id),
                other => other.into(),
            })?;

        obs::emit_user_activity_changed(user_id.as_str(), is_active);
        Ok(UserView::from(user))
    }

    /// Pull requests the user is assigned to review. Ids that no longer
    /// resolve to a pull request are skipped.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn assigned_pull_requests(&self, user_id: &UserId) -> Result<AssignedPullRequests> {
        if !self.stores.users.user_exists(user_id).await? {
            return Err(AssignmentError::user_not_found(user_id));
        }

        let ids = self
            .stores
            .assignments
            .assigned_pull_request_ids(user_id)
            .await?;
        let pull_requests = self
            .stores
            .pull_requests
            .get_pull_requests(&ids)
            .await?
            .into_iter()
            .map(PullRequestShort::from)
            .collect();

        Ok(AssignedPullRequests {
            user_id: user_id.clone(),
            pull_requests,
        })
    }
}
