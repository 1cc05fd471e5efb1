//! Engine behaviour against the in-memory backend: reviewer cap, idempotent
//! merge, reassignment checks and the exclusion rule.

use revassign_core::{AssignmentError, ErrorCode, ReviewerAssignmentEngine};
use revassign_state::{PullRequestStatus, Stores, Team, User, UserId};

async fn team(stores: &Stores, name: &str, members: &[(&str, bool)]) {
    stores.teams.save_team(&Team::new(name)).await.unwrap();
    for (id, active) in members {
        stores
            .users
            .save_user(&User {
                user_id: UserId::new(*id),
                username: format!("User {id}"),
                team_name: name.to_string(),
                is_active: *active,
            })
            .await
            .unwrap();
    }
}

fn engine(stores: &Stores) -> ReviewerAssignmentEngine {
    ReviewerAssignmentEngine::new(stores.clone())
}

// ===========================================================================
// Create
// ===========================================================================

#[tokio::test]
async fn create_assigns_two_when_two_or_more_eligible() {
    let stores = Stores::in_memory();
    team(
        &stores,
        "payments",
        &[("u1", true), ("u2", true), ("u3", true), ("u4", true)],
    )
    .await;

    let view = engine(&stores)
        .create_pull_request("pr-1".into(), "Add search".into(), "u1".into())
        .await
        .unwrap();

    assert_eq!(view.status, PullRequestStatus::Open);
    assert_eq!(view.assigned_reviewers.len(), 2);
    assert!(!view.assigned_reviewers.contains(&UserId::new("u1")));
    assert!(view.created_at.is_some());
    assert!(view.merged_at.is_none());

    let stored = stores
        .assignments
        .assigned_reviewer_ids(&"pr-1".into())
        .await
        .unwrap();
    assert_eq!(stored, view.assigned_reviewers);
}

#[tokio::test]
async fn create_assigns_one_when_one_eligible() {
    let stores = Stores::in_memory();
    team(
        &stores,
        "payments",
        &[("u1", true), ("u2", true), ("u3", false)],
    )
    .await;

    let view = engine(&stores)
        .create_pull_request("pr-1".into(), "Add search".into(), "u1".into())
        .await
        .unwrap();
    assert_eq!(view.assigned_reviewers, vec![UserId::new("u2")]);
}

#[tokio::test]
async fn create_succeeds_with_no_eligible_reviewers() {
    let stores = Stores::in_memory();
    team(&stores, "solo", &[("u1", true), ("u2", false)]).await;

    let view = engine(&stores)
        .create_pull_request("pr-1".into(), "Lonely change".into(), "u1".into())
        .await
        .unwrap();
    assert!(view.assigned_reviewers.is_empty());
    assert!(stores
        .pull_requests
        .pull_request_exists(&"pr-1".into())
        .await
        .unwrap());
}

#[tokio::test]
async fn create_only_draws_from_author_team() {
    let stores = Stores::in_memory();
    team(&stores, "payments", &[("u1", true)]).await;
    team(&stores, "search", &[("s1", true), ("s2", true)]).await;

    let view = engine(&stores)
        .create_pull_request("pr-1".into(), "Isolated".into(), "u1".into())
        .await
        .unwrap();
    assert!(view.assigned_reviewers.is_empty());
}

#[tokio::test]
async fn create_unknown_author_is_not_found() {
    let stores = Stores::in_memory();
    let err = engine(&stores)
        .create_pull_request("pr-1".into(), "x".into(), "ghost".into())
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::NotFound);
}

#[tokio::test]
async fn create_author_without_team_is_not_found() {
    let stores = Stores::in_memory();
    stores
        .users
        .save_user(&User {
            user_id: UserId::new("u1"),
            username: "Alice".into(),
            team_name: "disbanded".into(),
            is_active: true,
        })
        .await
        .unwrap();

    let err = engine(&stores)
        .create_pull_request("pr-1".into(), "x".into(), "u1".into())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AssignmentError::NotFound {
            resource: "team",
            ..
        }
    ));
}

#[tokio::test]
async fn create_duplicate_id_is_pr_exists() {
    let stores = Stores::in_memory();
    team(&stores, "payments", &[("u1", true), ("u2", true)]).await;
    let engine = engine(&stores);

    engine
        .create_pull_request("pr-1".into(), "first".into(), "u1".into())
        .await
        .unwrap();
    let err = engine
        .create_pull_request("pr-1".into(), "second".into(), "u2".into())
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::PrExists);

    let stored = stores
        .pull_requests
        .get_pull_request(&"pr-1".into())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.name, "first");
}

// ===========================================================================
// Merge
// ===========================================================================

#[tokio::test]
async fn merge_is_idempotent_and_keeps_first_timestamp() {
    let stores = Stores::in_memory();
    team(&stores, "payments", &[("u1", true), ("u2", true)]).await;
    let engine = engine(&stores);
    engine
        .create_pull_request("pr-1".into(), "Add search".into(), "u1".into())
        .await
        .unwrap();

    let first = engine.merge_pull_request("pr-1".into()).await.unwrap();
    assert_eq!(first.status, PullRequestStatus::Merged);
    assert!(first.merged_at.is_some());

    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    let second = engine.merge_pull_request("pr-1".into()).await.unwrap();
    assert_eq!(second.status, first.status);
    assert_eq!(second.merged_at, first.merged_at);
    assert_eq!(second.assigned_reviewers, first.assigned_reviewers);
}

#[tokio::test]
async fn merge_keeps_reviewer_edges() {
    let stores = Stores::in_memory();
    team(&stores, "payments", &[("u1", true), ("u2", true)]).await;
    let engine = engine(&stores);
    engine
        .create_pull_request("pr-1".into(), "Add search".into(), "u1".into())
        .await
        .unwrap();

    let merged = engine.merge_pull_request("pr-1".into()).await.unwrap();
    assert_eq!(merged.assigned_reviewers, vec![UserId::new("u2")]);
}

#[tokio::test]
async fn merge_unknown_is_not_found() {
    let stores = Stores::in_memory();
    let err = engine(&stores)
        .merge_pull_request("pr-404".into())
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::NotFound);
}

// ===========================================================================
// Reassign
// ===========================================================================

#[tokio::test]
async fn reassign_swaps_reviewer() {
    let stores = Stores::in_memory();
    team(
        &stores,
        "payments",
        &[("u1", true), ("u2", true), ("u3", true), ("u4", true)],
    )
    .await;
    let engine = engine(&stores);
    let created = engine
        .create_pull_request("pr-1".into(), "Add search".into(), "u1".into())
        .await
        .unwrap();
    // deterministic in-memory selection: u2, u3
    assert_eq!(
        created.assigned_reviewers,
        vec![UserId::new("u2"), UserId::new("u3")]
    );

    let outcome = engine
        .reassign_reviewer("pr-1".into(), "u2".into())
        .await
        .unwrap();
    assert_eq!(outcome.replaced_by, UserId::new("u4"));
    assert_eq!(
        outcome.pr.assigned_reviewers,
        vec![UserId::new("u3"), UserId::new("u4")]
    );
    assert!(stores
        .assignments
        .assigned_pull_request_ids(&"u2".into())
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn reassign_never_picks_author_or_current_reviewer() {
    let stores = Stores::in_memory();
    team(
        &stores,
        "payments",
        &[("u1", true), ("u2", true), ("u3", true), ("u4", true), ("u5", true)],
    )
    .await;
    let engine = engine(&stores);
    let created = engine
        .create_pull_request("pr-1".into(), "Add search".into(), "u3".into())
        .await
        .unwrap();
    let before = created.assigned_reviewers.clone();

    let outcome = engine
        .reassign_reviewer("pr-1".into(), before[0].clone())
        .await
        .unwrap();
    assert_ne!(outcome.replaced_by, UserId::new("u3"));
    assert!(!before.contains(&outcome.replaced_by));
    assert_eq!(outcome.pr.assigned_reviewers.len(), 2);
}

#[tokio::test]
async fn reassign_unknown_pull_request_is_not_found() {
    let stores = Stores::in_memory();
    team(&stores, "payments", &[("u1", true), ("u2", true)]).await;
    let err = engine(&stores)
        .reassign_reviewer("pr-404".into(), "u2".into())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AssignmentError::NotFound {
            resource: "pull request",
            ..
        }
    ));
}

#[tokio::test]
async fn reassign_unknown_reviewer_is_not_found() {
    let stores = Stores::in_memory();
    team(&stores, "payments", &[("u1", true), ("u2", true)]).await;
    let engine = engine(&stores);
    engine
        .create_pull_request("pr-1".into(), "x".into(), "u1".into())
        .await
        .unwrap();
    let err = engine
        .reassign_reviewer("pr-1".into(), "ghost".into())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AssignmentError::NotFound {
            resource: "user",
            ..
        }
    ));
}

#[tokio::test]
async fn reassign_on_merged_is_pr_merged_even_if_not_assigned() {
    let stores = Stores::in_memory();
    team(&stores, "payments", &[("u1", true), ("u2", true)]).await;
    let engine = engine(&stores);
    engine
        .create_pull_request("pr-1".into(), "x".into(), "u1".into())
        .await
        .unwrap();
    engine.merge_pull_request("pr-1".into()).await.unwrap();

    // u1 is the author, not a reviewer: merged is checked first
    let err = engine
        .reassign_reviewer("pr-1".into(), "u1".into())
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::PrMerged);
}

#[tokio::test]
async fn reassign_unassigned_reviewer_is_not_assigned() {
    let stores = Stores::in_memory();
    team(
        &stores,
        "payments",
        &[("u1", true), ("u2", true), ("u3", true), ("u4", true)],
    )
    .await;
    let engine = engine(&stores);
    engine
        .create_pull_request("pr-1".into(), "x".into(), "u1".into())
        .await
        .unwrap();

    let err = engine
        .reassign_reviewer("pr-1".into(), "u4".into())
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::NotAssigned);
}

#[tokio::test]
async fn reassign_without_spare_member_is_no_candidate() {
    let stores = Stores::in_memory();
    team(
        &stores,
        "payments",
        &[("u1", true), ("u2", true), ("u3", true), ("u4", false)],
    )
    .await;
    let engine = engine(&stores);
    engine
        .create_pull_request("pr-1".into(), "x".into(), "u1".into())
        .await
        .unwrap();

    let err = engine
        .reassign_reviewer("pr-1".into(), "u2".into())
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::NoCandidate);

    // nothing changed
    let reviewers = stores
        .assignments
        .assigned_reviewer_ids(&"pr-1".into())
        .await
        .unwrap();
    assert_eq!(reviewers, vec![UserId::new("u2"), UserId::new("u3")]);
}

#[tokio::test]
async fn reassign_draws_from_old_reviewer_team() {
    let stores = Stores::in_memory();
    team(&stores, "payments", &[("u1", true), ("u2", true)]).await;
    let engine = engine(&stores);
    engine
        .create_pull_request("pr-1".into(), "x".into(), "u1".into())
        .await
        .unwrap();

    // u2 moves to a team with a spare member
    team(&stores, "search", &[("s1", true)]).await;
    stores
        .users
        .update_user(&User {
            user_id: UserId::new("u2"),
            username: "User u2".into(),
            team_name: "search".into(),
            is_active: true,
        })
        .await
        .unwrap();

    let outcome = engine
        .reassign_reviewer("pr-1".into(), "u2".into())
        .await
        .unwrap();
    assert_eq!(outcome.replaced_by, UserId::new("s1"));
}

// ===========================================================================
// End-to-end scenarios
// ===========================================================================

#[tokio::test]
async fn scenario_create_merge_then_reassign_fails_merged() {
    let stores = Stores::in_memory();
    team(&stores, "payments", &[("u1", true), ("u2", true)]).await;
    let engine = engine(&stores);

    let created = engine
        .create_pull_request("pr-1001".into(), "Add search".into(), "u1".into())
        .await
        .unwrap();
    assert_eq!(created.assigned_reviewers, vec![UserId::new("u2")]);

    let merged = engine.merge_pull_request("pr-1001".into()).await.unwrap();
    assert_eq!(merged.status, PullRequestStatus::Merged);
    assert!(merged.merged_at.is_some());

    let err = engine
        .reassign_reviewer("pr-1001".into(), "u2".into())
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::PrMerged);
}

#[tokio::test]
async fn scenario_reassign_before_merge_fails_no_candidate() {
    let stores = Stores::in_memory();
    team(&stores, "payments", &[("u1", true), ("u2", true)]).await;
    let engine = engine(&stores);

    engine
        .create_pull_request("pr-1001".into(), "Add search".into(), "u1".into())
        .await
        .unwrap();
    let err = engine
        .reassign_reviewer("pr-1001".into(), "u2".into())
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::NoCandidate);
}
