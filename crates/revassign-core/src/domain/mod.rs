//! Domain types for revassign.
//!
//! - `AssignmentError` / `ErrorCode`: the failure taxonomy every flow returns
//! - views: what callers get back from the engine and the flows

pub mod error;
pub mod view;

pub use error::{AssignmentError, ErrorCode, Result};
pub use view::{
    AppStats, AssignedPullRequests, PullRequestShort, PullRequestView, ReassignOutcome,
    TeamMember, TeamRoster, UserView,
};
