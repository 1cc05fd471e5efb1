//! Reviewer assignment engine: create, merge and reassign.
//!
//! The engine owns no state. Each operation is a sequential chain of calls
//! into the [`Stores`] collaborators with no transaction around it, so two
//! concurrent calls on the same pull request can interleave.

use chrono::Utc;
use revassign_state::{PullRequest, PullRequestId, StorageError, Stores, UserId};
use tracing::{debug, instrument};

use crate::domain::{AssignmentError, PullRequestView, ReassignOutcome, Result};
use crate::metrics::METRICS;
use crate::obs;

/// Reviewers assigned to a new pull request when nothing else is configured.
pub const DEFAULT_MAX_REVIEWERS: usize = 2;

/// Tunables of reviewer selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssignmentPolicy {
    /// Upper bound on reviewer edges per pull request.
    pub max_reviewers: usize,
}

impl Default for AssignmentPolicy {
    fn default() -> Self {
        Self {
            max_reviewers: DEFAULT_MAX_REVIEWERS,
        }
    }
}

impl AssignmentPolicy {
    pub fn new(max_reviewers: usize) -> Result<Self> {
        if max_reviewers == 0 {
            return Err(AssignmentError::InvalidInput(
                "max_reviewers must be at least 1".to_string(),
            ));
        }
        Ok(Self { max_reviewers })
    }
}

#[derive(Clone)]
pub struct ReviewerAssignmentEngine {
    stores: Stores,
    policy: AssignmentPolicy,
}

impl ReviewerAssignmentEngine {
    pub fn new(stores: Stores) -> Self {
        Self::with_policy(stores, AssignmentPolicy::default())
    }

    pub fn with_policy(stores: Stores, policy: AssignmentPolicy) -> Self {
        Self { stores, policy }
    }

    pub fn policy(&self) -> AssignmentPolicy {
        self.policy
    }

    /// Open a pull request and assign up to `max_reviewers` active
    /// teammates of the author.
    ///
    /// Reviewer edges are best-effort: a failed edge write is logged and
    /// counted, and the returned view lists only the edges that were stored.
    #[instrument(skip(self, name), fields(pull_request_id = %pull_request_id, author_id = %author_id))]
    pub async fn create_pull_request(
        &self,
        pull_request_id: PullRequestId,
        name: String,
        author_id: UserId,
    ) -> Result<PullRequestView> {
        let author = self
            .stores
            .users
            .get_user(&author_id)
            .await?
            .ok_or_else(|| AssignmentError::user_not_found(&author_id))?;

        if !self.stores.teams.team_exists(&author.team_name).await? {
            return Err(AssignmentError::team_not_found(&author.team_name));
        }

        if self
            .stores
            .pull_requests
            .pull_request_exists(&pull_request_id)
            .await?
        {
            return Err(AssignmentError::PrExists {
                pull_request_id: pull_request_id.to_string(),
            });
        }

        let candidates = self
            .stores
            .users
            .choose_reviewers(&author, self.policy.max_reviewers)
            .await?;
        debug!(candidates = candidates.len(), "reviewer candidates selected");

        let pr = PullRequest::open(pull_request_id, name, author_id);
        self.stores
            .pull_requests
            .save_pull_request(&pr)
            .await
            .map_err(|e| match e {
                // lost the race against a concurrent create with the same id
                StorageError::Duplicate { id, .. } => AssignmentError::PrExists {
                    pull_request_id: id,
                },
                other => other.into(),
            })?;

        let mut assigned = Vec::with_capacity(candidates.len());
        for reviewer in candidates.into_iter().take(self.policy.max_reviewers) {
            match self
                .stores
                .assignments
                .create_assignment(&reviewer, &pr.pull_request_id)
                .await
            {
                Ok(()) => assigned.push(reviewer),
                Err(e) => {
                    METRICS.inc_assignment_write_failures();
                    obs::emit_assignment_write_failed(
                        pr.pull_request_id.as_str(),
                        reviewer.as_str(),
                        &e,
                    );
                }
            }
        }

        METRICS.inc_pull_requests_created();
        obs::emit_pr_created(
            pr.pull_request_id.as_str(),
            pr.author_id.as_str(),
            assigned.len(),
        );
        Ok(PullRequestView::new(pr, assigned))
    }

    /// Mark a pull request MERGED. Merging twice returns the stored state
    /// and keeps the first `merged_at`. Reviewer edges are kept.
    #[instrument(skip(self), fields(pull_request_id = %pull_request_id))]
    pub async fn merge_pull_request(
        &self,
        pull_request_id: PullRequestId,
    ) -> Result<PullRequestView> {
        let mut pr = self
            .stores
            .pull_requests
            .get_pull_request(&pull_request_id)
            .await?
            .ok_or_else(|| AssignmentError::pull_request_not_found(&pull_request_id))?;

        if pr.mark_merged(Utc::now()) {
            self.stores
                .pull_requests
                .update_pull_request(&pr)
                .await
                .map_err(|e| match e {
                    StorageError::PullRequestNotFound { pull_request_id } => {
                        AssignmentError::pull_request_not_found(pull_request_id)
                    }
                    other => other.into(),
                })?;
            METRICS.inc_pull_requests_merged();
            obs::emit_pr_merged(pull_request_id.as_str());
        } else {
            obs::emit_pr_merge_noop(pull_request_id.as_str());
        }

        let reviewers = self
            .stores
            .assignments
            .assigned_reviewer_ids(&pull_request_id)
            .await?;
        Ok(PullRequestView::new(pr, reviewers))
    }

    /// Replace `old_reviewer_id` with another active member of their team.
    ///
    /// Checks run in a fixed order: existence, merged, assigned, candidate.
    /// The replacement is never the author and never a current reviewer.
    /// The edge swap is delete-then-create without a transaction; if the
    /// create fails the pull request is left one reviewer short and the
    /// failure is reported as `reassign.partial`.
    #[instrument(skip(self), fields(pull_request_id = %pull_request_id, old_reviewer_id = %old_reviewer_id))]
    pub async fn reassign_reviewer(
        &self,
        pull_request_id: PullRequestId,
        old_reviewer_id: UserId,
    ) -> Result<ReassignOutcome> {
        let pr = self
            .stores
            .pull_requests
            .get_pull_request(&pull_request_id)
            .await?
            .ok_or_else(|| AssignmentError::pull_request_not_found(&pull_request_id))?;
        let old_reviewer = self
            .stores
            .users
            .get_user(&old_reviewer_id)
            .await?
            .ok_or_else(|| AssignmentError::user_not_found(&old_reviewer_id))?;

        if pr.is_merged() {
            return Err(AssignmentError::PrMerged);
        }

        let current = self
            .stores
            .assignments
            .assigned_reviewer_ids(&pull_request_id)
            .await?;
        if !current.contains(&old_reviewer.user_id) {
            return Err(AssignmentError::NotAssigned);
        }

        let mut exclude = current;
        if !exclude.contains(&pr.author_id) {
            exclude.push(pr.author_id.clone());
        }

        let replacement = self
            .stores
            .users
            .reassign_reviewer(&old_reviewer.team_name, &exclude)
            .await?
            .ok_or(AssignmentError::NoCandidate)?;

        self.stores
            .assignments
            .delete_assignment(&old_reviewer.user_id, &pull_request_id)
            .await?;
        if let Err(e) = self
            .stores
            .assignments
            .create_assignment(&replacement, &pull_request_id)
            .await
        {
            obs::emit_reassign_partial(
                pull_request_id.as_str(),
                old_reviewer.user_id.as_str(),
                replacement.as_str(),
                &e,
            );
            return Err(e.into());
        }

        METRICS.inc_reassignments();
        obs::emit_pr_reassigned(
            pull_request_id.as_str(),
            old_reviewer.user_id.as_str(),
            replacement.as_str(),
        );

        let reviewers = self
            .stores
            .assignments
            .assigned_reviewer_ids(&pull_request_id)
            .await?;
        Ok(ReassignOutcome {
            pr: PullRequestView::new(pr, reviewers),
            replaced_by: replacement,
        })
    }
}
