//! HTTP surface of the daemon.

pub mod api;
pub mod dto;
pub mod error;

use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub use error::{ApiError, ErrorBody, ErrorDetail};

/// Create the router with all routes
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/team/add", post(api::add_team))
        .route("/team/get", get(api::get_team))
        .route("/users/setIsActive", post(api::set_is_active))
        .route("/users/getReview", get(api::get_review))
        .route("/pullRequest/create", post(api::create_pull_request))
        .route("/pullRequest/merge", post(api::merge_pull_request))
        .route("/pullRequest/reassign", post(api::reassign_reviewer))
        .route("/stats", get(api::stats))
        .route("/health", get(api::health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
