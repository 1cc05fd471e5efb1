//! Route handlers.
//!
//! Handlers validate the request shape, call one service method and wrap the
//! result. All failures go through [`ApiError`].

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use revassign_core::{
    AppStats, AssignedPullRequests, AssignmentError, ReassignOutcome, TeamRoster,
};
use revassign_state::UserId;

use super::dto::*;
use super::error::ApiError;
use crate::state::AppState;

type ApiResult<T> = Result<T, ApiError>;

fn require(field: &'static str, value: &str) -> ApiResult<()> {
    if value.trim().is_empty() {
        return Err(ApiError(AssignmentError::InvalidInput(format!(
            "{field} must not be empty"
        ))));
    }
    Ok(())
}

// ── Teams ────────────────────────────────────────────────────────────────────

pub async fn add_team(
    State(state): State<AppState>,
    body: Result<Json<TeamRoster>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<TeamResponse>)> {
    let Json(roster) = body?;
    require("team_name", &roster.team_name)?;
    for member in &roster.members {
        require("user_id", member.user_id.as_str())?;
    }

    let team = state.teams.add_team(roster).await?;
    Ok((StatusCode::CREATED, Json(TeamResponse { team })))
}

pub async fn get_team(
    State(state): State<AppState>,
    query: Result<Query<TeamQuery>, QueryRejection>,
) -> ApiResult<Json<TeamRoster>> {
    let Query(query) = query?;
    require("team_name", &query.team_name)?;
    Ok(Json(state.teams.get_team(&query.team_name).await?))
}

// ── Users ────────────────────────────────────────────────────────────────────

pub async fn set_is_active(
    State(state): State<AppState>,
    body: Result<Json<SetIsActiveRequest>, JsonRejection>,
) -> ApiResult<Json<UserResponse>> {
    let Json(req) = body?;
    require("user_id", req.user_id.as_str())?;
    let user = state.users.set_is_active(&req.user_id, req.is_active).await?;
    Ok(Json(UserResponse { user }))
}

pub async fn get_review(
    State(state): State<AppState>,
    query: Result<Query<UserQuery>, QueryRejection>,
) -> ApiResult<Json<AssignedPullRequests>> {
    let Query(query) = query?;
    require("user_id", &query.user_id)?;
    let user_id = UserId::new(query.user_id);
    Ok(Json(state.users.assigned_pull_requests(&user_id).await?))
}

// ── Pull requests ────────────────────────────────────────────────────────────

pub async fn create_pull_request(
    State(state): State<AppState>,
    body: Result<Json<CreatePullRequestRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<PullRequestResponse>)> {
    let Json(req) = body?;
    require("pull_request_id", req.pull_request_id.as_str())?;
    require("pull_request_name", &req.pull_request_name)?;
    require("author_id", req.author_id.as_str())?;

    let pr = state
        .engine
        .create_pull_request(req.pull_request_id, req.pull_request_name, req.author_id)
        .await?;
    Ok((StatusCode::CREATED, Json(PullRequestResponse { pr })))
}

pub async fn merge_pull_request(
    State(state): State<AppState>,
    body: Result<Json<MergePullRequestRequest>, JsonRejection>,
) -> ApiResult<Json<PullRequestResponse>> {
    let Json(req) = body?;
    require("pull_request_id", req.pull_request_id.as_str())?;
    let pr = state.engine.merge_pull_request(req.pull_request_id).await?;
    Ok(Json(PullRequestResponse { pr }))
}

pub async fn reassign_reviewer(
    State(state): State<AppState>,
    body: Result<Json<ReassignRequest>, JsonRejection>,
) -> ApiResult<Json<ReassignOutcome>> {
    let Json(req) = body?;
    require("pull_request_id", req.pull_request_id.as_str())?;
    require("old_reviewer_id", req.old_reviewer_id.as_str())?;
    let outcome = state
        .engine
        .reassign_reviewer(req.pull_request_id, req.old_reviewer_id)
        .await?;
    Ok(Json(outcome))
}

// ── Service ──────────────────────────────────────────────────────────────────

pub async fn stats(State(state): State<AppState>) -> ApiResult<Json<AppStats>> {
    Ok(Json(state.stats.collect().await?))
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        backend: state.backend.to_string(),
    })
}
