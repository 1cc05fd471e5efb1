//! Structured lifecycle events for pull requests, teams and users.
//!
//! Every event carries an `event` field so log pipelines can filter on it.
//! Successful transitions log at `info!`, degraded outcomes at `warn!`.

use tracing::{info, warn};

pub fn emit_pr_created(pull_request_id: &str, author_id: &str, reviewers: usize) {
    info!(
        event = "pr.created",
        pull_request_id = %pull_request_id,
        author_id = %author_id,
        reviewers = reviewers,
    );
}

pub fn emit_pr_merged(pull_request_id: &str) {
    info!(event = "pr.merged", pull_request_id = %pull_request_id);
}

/// Merge of an already merged pull request.
pub fn emit_pr_merge_noop(pull_request_id: &str) {
    info!(event = "pr.merge_noop", pull_request_id = %pull_request_id);
}

pub fn emit_pr_reassigned(pull_request_id: &str, old_reviewer_id: &str, new_reviewer_id: &str) {
    info!(
        event = "pr.reassigned",
        pull_request_id = %pull_request_id,
        old_reviewer_id = %old_reviewer_id,
        new_reviewer_id = %new_reviewer_id,
    );
}

pub fn emit_team_added(team_name: &str, members: usize) {
    info!(event = "team.added", team_name = %team_name, members = members);
}

pub fn emit_user_activity_changed(user_id: &str, is_active: bool) {
    info!(event = "user.activity_changed", user_id = %user_id, is_active = is_active);
}

/// A reviewer edge was not recorded after the pull request was saved.
pub fn emit_assignment_write_failed(
    pull_request_id: &str,
    reviewer_id: &str,
    error: &dyn std::fmt::Display,
) {
    warn!(
        event = "assignment.write_failed",
        pull_request_id = %pull_request_id,
        reviewer_id = %reviewer_id,
        error = %error,
    );
}

/// The old edge was removed but the replacement edge was not recorded.
pub fn emit_reassign_partial(
    pull_request_id: &str,
    old_reviewer_id: &str,
    new_reviewer_id: &str,
    error: &dyn std::fmt::Display,
) {
    warn!(
        event = "reassign.partial",
        pull_request_id = %pull_request_id,
        old_reviewer_id = %old_reviewer_id,
        new_reviewer_id = %new_reviewer_id,
        error = %error,
    );
}

/// A roster member could not be created or updated.
pub fn emit_member_write_failed(team_name: &str, user_id: &str, error: &dyn std::fmt::Display) {
    warn!(
        event = "team.member_write_failed",
        team_name = %team_name,
        user_id = %user_id,
        error = %error,
    );
}
