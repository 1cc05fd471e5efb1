//! revassign core library
//!
//! The reviewer assignment engine and the thin flows around it. Everything
//! here talks to storage through [`revassign_state::Stores`] and holds no
//! state of its own, so every type is cheap to clone and share.

pub mod domain;
pub mod engine;
pub mod metrics;
pub mod obs;
pub mod stats;
pub mod team;
pub mod telemetry;
pub mod user;

pub use domain::{
    AppStats, AssignedPullRequests, AssignmentError, ErrorCode, PullRequestShort,
    PullRequestView, ReassignOutcome, Result, TeamMember, TeamRoster, UserView,
};
pub use engine::{AssignmentPolicy, ReviewerAssignmentEngine, DEFAULT_MAX_REVIEWERS};
pub use metrics::{Metrics, MetricsSnapshot, METRICS};
pub use stats::StatsService;
pub use team::TeamService;
pub use telemetry::{init_cli_tracing, init_tracing};
pub use user::UserService;

pub use revassign_state::{PullRequestId, PullRequestStatus, Stores, UserId};
