//! Trait contract tests for TeamDirectory, UserDirectory, AssignmentLedger
//! and PullRequestStore.
//!
//! Every contract is written once against a `Stores` bundle and run against
//! both backends: the in-memory store and SurrealDB on the `mem://` engine.

use chrono::Utc;
use revassign_state::storage_traits::*;
use revassign_state::{StorageError, SurrealStore};
use std::sync::Arc;

fn user(id: &str, team: &str, active: bool) -> User {
    User {
        user_id: UserId::new(id),
        username: format!("name-{id}"),
        team_name: team.to_string(),
        is_active: active,
    }
}

async fn seed_payments(stores: &Stores) {
    stores.teams.save_team(&Team::new("payments")).await.unwrap();
    for u in [
        user("u1", "payments", true),
        user("u2", "payments", true),
        user("u3", "payments", true),
        user("u4", "payments", false),
    ] {
        stores.users.save_user(&u).await.unwrap();
    }
}

// ===========================================================================
// Contracts
// ===========================================================================

mod contract {
    use super::*;

    pub async fn team_save_and_exists(stores: Stores) {
        assert!(!stores.teams.team_exists("payments").await.unwrap());
        stores.teams.save_team(&Team::new("payments")).await.unwrap();
        assert!(stores.teams.team_exists("payments").await.unwrap());
        assert_eq!(
            stores.teams.get_team("payments").await.unwrap(),
            Some(Team::new("payments"))
        );
        assert_eq!(stores.teams.get_team("search").await.unwrap(), None);
        assert_eq!(stores.teams.team_count().await.unwrap(), 1);
    }

    pub async fn team_save_duplicate_fails(stores: Stores) {
        stores.teams.save_team(&Team::new("payments")).await.unwrap();
        let err = stores
            .teams
            .save_team(&Team::new("payments"))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Duplicate { kind: "team", .. }));
        assert_eq!(stores.teams.team_count().await.unwrap(), 1);
    }

    pub async fn user_save_get_update(stores: Stores) {
        let mut alice = user("u1", "payments", true);
        stores.users.save_user(&alice).await.unwrap();
        assert!(stores.users.user_exists(&alice.user_id).await.unwrap());
        assert_eq!(
            stores.users.get_user(&alice.user_id).await.unwrap(),
            Some(alice.clone())
        );

        alice.team_name = "search".into();
        alice.is_active = false;
        stores.users.update_user(&alice).await.unwrap();
        let stored = stores.users.get_user(&alice.user_id).await.unwrap().unwrap();
        assert_eq!(stored.team_name, "search");
        assert!(!stored.is_active);
        assert_eq!(stores.users.total_user_count().await.unwrap(), 1);
    }

    pub async fn user_duplicate_and_missing(stores: Stores) {
        stores
            .users
            .save_user(&user("u1", "payments", true))
            .await
            .unwrap();
        let dup = stores
            .users
            .save_user(&user("u1", "search", true))
            .await
            .unwrap_err();
        assert!(matches!(dup, StorageError::Duplicate { kind: "user", .. }));

        let missing = stores
            .users
            .update_user(&user("ghost", "payments", true))
            .await
            .unwrap_err();
        assert!(matches!(missing, StorageError::UserNotFound { .. }));
        assert_eq!(stores.users.get_user(&UserId::new("ghost")).await.unwrap(), None);
    }

    pub async fn team_members_derived_from_users(stores: Stores) {
        seed_payments(&stores).await;
        stores
            .users
            .save_user(&user("u9", "search", true))
            .await
            .unwrap();
        let mut members: Vec<String> = stores
            .users
            .get_team_members("payments")
            .await
            .unwrap()
            .into_iter()
            .map(|u| u.user_id.0)
            .collect();
        members.sort();
        assert_eq!(members, vec!["u1", "u2", "u3", "u4"]);
        assert!(stores.users.get_team_members("nobody").await.unwrap().is_empty());
    }

    pub async fn choose_reviewers_filters_and_caps(stores: Stores) {
        seed_payments(&stores).await;
        let author = user("u1", "payments", true);

        let picked = stores.users.choose_reviewers(&author, 2).await.unwrap();
        assert_eq!(picked.len(), 2);
        for id in &picked {
            assert_ne!(id, &author.user_id);
            assert_ne!(id.as_str(), "u4", "inactive user picked");
        }

        let all = stores.users.choose_reviewers(&author, 10).await.unwrap();
        assert_eq!(all.len(), 2);

        let lonely = user("u9", "search", true);
        stores.users.save_user(&lonely).await.unwrap();
        assert!(stores
            .users
            .choose_reviewers(&lonely, 2)
            .await
            .unwrap()
            .is_empty());
    }

    pub async fn reassign_reviewer_excludes_set(stores: Stores) {
        seed_payments(&stores).await;
        let exclude = vec![UserId::new("u1"), UserId::new("u2")];
        let picked = stores
            .users
            .reassign_reviewer("payments", &exclude)
            .await
            .unwrap();
        assert_eq!(picked, Some(UserId::new("u3")));

        let exclude = vec![UserId::new("u1"), UserId::new("u2"), UserId::new("u3")];
        assert_eq!(
            stores
                .users
                .reassign_reviewer("payments", &exclude)
                .await
                .unwrap(),
            None
        );
    }

    pub async fn user_counts(stores: Stores) {
        assert_eq!(stores.users.total_user_count().await.unwrap(), 0);
        assert_eq!(stores.users.active_user_count().await.unwrap(), 0);
        assert!(stores.users.user_count_by_team().await.unwrap().is_empty());

        seed_payments(&stores).await;
        stores
            .users
            .save_user(&user("u9", "search", true))
            .await
            .unwrap();
        assert_eq!(stores.users.total_user_count().await.unwrap(), 5);
        assert_eq!(stores.users.active_user_count().await.unwrap(), 4);
        assert_eq!(
            stores.users.user_count_by_team().await.unwrap(),
            vec![
                TeamSize {
                    team_name: "payments".into(),
                    user_count: 4
                },
                TeamSize {
                    team_name: "search".into(),
                    user_count: 1
                },
            ]
        );
    }

    pub async fn assignments_edges(stores: Stores) {
        let pr = PullRequestId::new("pr-1");
        let u2 = UserId::new("u2");
        let u3 = UserId::new("u3");

        stores.assignments.create_assignment(&u3, &pr).await.unwrap();
        stores.assignments.create_assignment(&u2, &pr).await.unwrap();
        let dup = stores
            .assignments
            .create_assignment(&u2, &pr)
            .await
            .unwrap_err();
        assert!(matches!(dup, StorageError::Duplicate { .. }));

        assert_eq!(
            stores.assignments.assigned_reviewer_ids(&pr).await.unwrap(),
            vec![u2.clone(), u3.clone()]
        );
        assert_eq!(
            stores
                .assignments
                .assigned_pull_request_ids(&u2)
                .await
                .unwrap(),
            vec![pr.clone()]
        );

        stores.assignments.delete_assignment(&u2, &pr).await.unwrap();
        // absent pair is a no-op
        stores.assignments.delete_assignment(&u2, &pr).await.unwrap();
        assert_eq!(
            stores.assignments.assigned_reviewer_ids(&pr).await.unwrap(),
            vec![u3.clone()]
        );
        assert!(stores
            .assignments
            .assigned_pull_request_ids(&u2)
            .await
            .unwrap()
            .is_empty());
    }

    pub async fn assignment_counts_per_reviewer(stores: Stores) {
        let u2 = UserId::new("u2");
        let u3 = UserId::new("u3");
        for pr in ["pr-1", "pr-2", "pr-3"] {
            stores
                .assignments
                .create_assignment(&u2, &PullRequestId::new(pr))
                .await
                .unwrap();
        }
        stores
            .assignments
            .create_assignment(&u3, &PullRequestId::new("pr-1"))
            .await
            .unwrap();

        assert_eq!(
            stores.assignments.assignment_counts().await.unwrap(),
            vec![
                ReviewerLoad {
                    user_id: u2,
                    assignments_count: 3
                },
                ReviewerLoad {
                    user_id: u3,
                    assignments_count: 1
                },
            ]
        );
    }

    pub async fn pull_request_lifecycle(stores: Stores) {
        let mut pr = PullRequest::open("pr-1", "Add search", "u1");
        assert!(!stores
            .pull_requests
            .pull_request_exists(&pr.pull_request_id)
            .await
            .unwrap());
        stores.pull_requests.save_pull_request(&pr).await.unwrap();
        assert!(stores
            .pull_requests
            .pull_request_exists(&pr.pull_request_id)
            .await
            .unwrap());

        let stored = stores
            .pull_requests
            .get_pull_request(&pr.pull_request_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.status, PullRequestStatus::Open);
        assert_eq!(stored.name, "Add search");
        assert!(stored.merged_at.is_none());

        pr.mark_merged(Utc::now());
        stores.pull_requests.update_pull_request(&pr).await.unwrap();
        let stored = stores
            .pull_requests
            .get_pull_request(&pr.pull_request_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.status, PullRequestStatus::Merged);
        assert!(stored.merged_at.is_some());

        assert_eq!(
            stores
                .pull_requests
                .count_by_status(PullRequestStatus::Merged)
                .await
                .unwrap(),
            1
        );
        assert_eq!(
            stores
                .pull_requests
                .count_by_status(PullRequestStatus::Open)
                .await
                .unwrap(),
            0
        );
    }

    pub async fn pull_request_duplicate_and_missing(stores: Stores) {
        let pr = PullRequest::open("pr-1", "Add search", "u1");
        stores.pull_requests.save_pull_request(&pr).await.unwrap();
        let dup = stores
            .pull_requests
            .save_pull_request(&pr)
            .await
            .unwrap_err();
        assert!(matches!(dup, StorageError::Duplicate { .. }));

        let ghost = PullRequest::open("pr-404", "Ghost", "u1");
        let missing = stores
            .pull_requests
            .update_pull_request(&ghost)
            .await
            .unwrap_err();
        assert!(matches!(missing, StorageError::PullRequestNotFound { .. }));
        assert_eq!(
            stores
                .pull_requests
                .get_pull_request(&ghost.pull_request_id)
                .await
                .unwrap(),
            None
        );
    }

    pub async fn get_pull_requests_skips_missing_keeps_order(stores: Stores) {
        for id in ["pr-1", "pr-2", "pr-3"] {
            stores
                .pull_requests
                .save_pull_request(&PullRequest::open(id, format!("name {id}"), "u1"))
                .await
                .unwrap();
        }
        let ids = vec![
            PullRequestId::new("pr-3"),
            PullRequestId::new("pr-missing"),
            PullRequestId::new("pr-1"),
        ];
        let found: Vec<String> = stores
            .pull_requests
            .get_pull_requests(&ids)
            .await
            .unwrap()
            .into_iter()
            .map(|pr| pr.pull_request_id.0)
            .collect();
        assert_eq!(found, vec!["pr-3", "pr-1"]);
        assert!(stores
            .pull_requests
            .get_pull_requests(&[])
            .await
            .unwrap()
            .is_empty());
    }
}

macro_rules! contract_suite {
    ($make:expr; $($name:ident),* $(,)?) => {
        $(
            #[tokio::test]
            async fn $name() {
                let stores: Stores = $make;
                super::contract::$name(stores).await;
            }
        )*
    };
}

// ===========================================================================
// In-memory backend
// ===========================================================================

mod memory {
    use super::*;

    contract_suite!(Stores::in_memory();
        team_save_and_exists,
        team_save_duplicate_fails,
        user_save_get_update,
        user_duplicate_and_missing,
        team_members_derived_from_users,
        choose_reviewers_filters_and_caps,
        reassign_reviewer_excludes_set,
        user_counts,
        assignments_edges,
        assignment_counts_per_reviewer,
        pull_request_lifecycle,
        pull_request_duplicate_and_missing,
        get_pull_requests_skips_missing_keeps_order,
    );
}

// ===========================================================================
// SurrealDB backend (mem:// engine)
// ===========================================================================

mod surreal {
    use super::*;

    async fn stores() -> Stores {
        Stores::from_backend(Arc::new(SurrealStore::in_memory().await.unwrap()))
    }

    contract_suite!(stores().await;
        team_save_and_exists,
        team_save_duplicate_fails,
        user_save_get_update,
        user_duplicate_and_missing,
        team_members_derived_from_users,
        choose_reviewers_filters_and_caps,
        reassign_reviewer_excludes_set,
        user_counts,
        assignments_edges,
        assignment_counts_per_reviewer,
        pull_request_lifecycle,
        pull_request_duplicate_and_missing,
        get_pull_requests_skips_missing_keeps_order,
    );
}
