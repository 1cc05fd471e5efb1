//! revassign - command-line client for the reviewer assignment service
//!
//! ## Commands
//!
//! - `team add|get`: register a team roster or show one
//! - `user set-active|reviews`: toggle availability, list assigned reviews
//! - `pr create|merge|reassign`: pull request lifecycle
//! - `stats`: service-wide counters
//! - `loadtest`: drive the payments scenario at a fixed rate

mod client;
mod loadtest;

use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use revassign_core::{
    AppStats, AssignedPullRequests, PullRequestView, ReassignOutcome, TeamMember, TeamRoster,
};
use revassign_state::{PullRequestId, UserId};
use revassignd::http::dto::{
    CreatePullRequestRequest, MergePullRequestRequest, PullRequestResponse, ReassignRequest,
    SetIsActiveRequest, TeamResponse, UserResponse,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::Level;

use client::ApiClient;
use loadtest::LoadTestConfig;

#[derive(Parser)]
#[command(name = "revassign")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Pull request reviewer assignment client", long_about = None)]
struct Cli {
    /// Base URL of the revassignd server
    #[arg(long, global = true, env = "REVASSIGN_SERVER", default_value = "http://localhost:8080")]
    server: String,

    /// Print raw JSON responses and JSON log lines
    #[arg(long, global = true)]
    json: bool,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Team rosters
    Team {
        #[command(subcommand)]
        action: TeamAction,
    },

    /// User availability and review queues
    User {
        #[command(subcommand)]
        action: UserAction,
    },

    /// Pull request lifecycle
    Pr {
        #[command(subcommand)]
        action: PrAction,
    },

    /// Show service statistics
    Stats,

    /// Run the payments load scenario against the server
    Loadtest {
        /// Requests per second
        #[arg(long, default_value = "5")]
        rate: u32,

        /// How long to keep firing, in seconds
        #[arg(long, default_value = "30")]
        duration_secs: u64,

        /// Maximum in-flight requests
        #[arg(long, default_value = "20")]
        workers: usize,

        /// Per-request timeout, in seconds
        #[arg(long, default_value = "10")]
        timeout_secs: u64,
    },
}

#[derive(Subcommand)]
enum TeamAction {
    /// Create a team and upsert its members
    Add {
        /// Team name
        #[arg(short, long)]
        name: String,

        /// Member as `id:username` or `id:username:inactive` (repeatable)
        #[arg(short, long = "member", value_parser = parse_member)]
        members: Vec<TeamMember>,
    },

    /// Show a team roster
    Get {
        /// Team name
        name: String,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Mark a user active or inactive
    SetActive {
        /// User ID
        user_id: String,

        /// New availability
        #[arg(long, action = clap::ArgAction::Set)]
        active: bool,
    },

    /// List pull requests a user is assigned to review
    Reviews {
        /// User ID
        user_id: String,
    },
}

#[derive(Subcommand)]
enum PrAction {
    /// Open a pull request and auto-assign reviewers
    Create {
        /// Pull request ID
        id: String,

        /// Pull request title
        name: String,

        /// Author user ID
        #[arg(short, long)]
        author: String,
    },

    /// Mark a pull request merged
    Merge {
        /// Pull request ID
        id: String,
    },

    /// Swap one reviewer for another teammate
    Reassign {
        /// Pull request ID
        id: String,

        /// Reviewer to replace
        #[arg(long)]
        old_reviewer: String,
    },
}

/// Parse `id:username[:inactive]`.
fn parse_member(raw: &str) -> Result<TeamMember, String> {
    let mut parts = raw.split(':');
    let user_id = parts.next().unwrap_or_default().trim();
    let username = parts.next().map(str::trim).unwrap_or_default();
    if user_id.is_empty() || username.is_empty() {
        return Err(format!("expected id:username[:inactive], got '{raw}'"));
    }
    let is_active = match parts.next() {
        None | Some("active") => true,
        Some("inactive") => false,
        Some(other) => return Err(format!("unknown member flag '{other}'")),
    };
    if parts.next().is_some() {
        return Err(format!("too many ':' separators in '{raw}'"));
    }
    Ok(TeamMember {
        user_id: UserId::new(user_id),
        username: username.to_string(),
        is_active,
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::WARN };
    revassign_core::init_cli_tracing(cli.json, level);

    let client = ApiClient::new(&cli.server)?;
    let json = cli.json;

    match cli.command {
        Commands::Team { action } => match action {
            TeamAction::Add { name, members } => cmd_team_add(&client, name, members, json).await,
            TeamAction::Get { name } => cmd_team_get(&client, &name, json).await,
        },
        Commands::User { action } => match action {
            UserAction::SetActive { user_id, active } => {
                cmd_user_set_active(&client, &user_id, active, json).await
            }
            UserAction::Reviews { user_id } => cmd_user_reviews(&client, &user_id, json).await,
        },
        Commands::Pr { action } => match action {
            PrAction::Create { id, name, author } => {
                cmd_pr_create(&client, &id, name, &author, json).await
            }
            PrAction::Merge { id } => cmd_pr_merge(&client, &id, json).await,
            PrAction::Reassign { id, old_reviewer } => {
                cmd_pr_reassign(&client, &id, &old_reviewer, json).await
            }
        },
        Commands::Stats => cmd_stats(&client, json).await,
        Commands::Loadtest {
            rate,
            duration_secs,
            workers,
            timeout_secs,
        } => {
            let config = LoadTestConfig {
                rate,
                duration: Duration::from_secs(duration_secs),
                workers,
                timeout: Duration::from_secs(timeout_secs),
            };
            cmd_loadtest(client, config, json).await
        }
    }
}

/// Print the raw body in JSON mode, otherwise decode it as `T` and hand it
/// to `render`.
fn emit<T: DeserializeOwned>(body: Value, json: bool, render: impl FnOnce(T)) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(&body)?);
        return Ok(());
    }
    let decoded: T = serde_json::from_value(body).context("Unexpected response shape")?;
    render(decoded);
    Ok(())
}

fn print_roster(team: &TeamRoster) {
    println!("Team: {}", team.team_name);
    if team.members.is_empty() {
        println!("  (no members)");
    }
    for m in &team.members {
        let flag = if m.is_active { "active" } else { "inactive" };
        println!("  {:<12} {:<20} {}", m.user_id.as_str(), m.username, flag);
    }
}

fn print_pull_request(pr: &PullRequestView) {
    println!("{} [{}] {}", pr.pull_request_id, pr.status, pr.pull_request_name);
    println!("  Author:    {}", pr.author_id);
    if pr.assigned_reviewers.is_empty() {
        println!("  Reviewers: (none)");
    } else {
        let reviewers: Vec<&str> = pr.assigned_reviewers.iter().map(|r| r.as_str()).collect();
        println!("  Reviewers: {}", reviewers.join(", "));
    }
    if let Some(created) = pr.created_at {
        println!("  Created:   {}", created.to_rfc3339());
    }
    if let Some(merged) = pr.merged_at {
        println!("  Merged:    {}", merged.to_rfc3339());
    }
}

async fn cmd_team_add(
    client: &ApiClient,
    name: String,
    members: Vec<TeamMember>,
    json: bool,
) -> Result<()> {
    if members.is_empty() {
        bail!("at least one --member is required");
    }
    let roster = TeamRoster {
        team_name: name,
        members,
    };
    let body = client.post("/team/add", &roster).await?.into_result()?;
    emit(body, json, |resp: TeamResponse| {
        println!("✓ Team created");
        print_roster(&resp.team);
    })
}

async fn cmd_team_get(client: &ApiClient, name: &str, json: bool) -> Result<()> {
    let body = client
        .get("/team/get", &[("team_name", name)])
        .await?
        .into_result()?;
    emit(body, json, |team: TeamRoster| print_roster(&team))
}

async fn cmd_user_set_active(
    client: &ApiClient,
    user_id: &str,
    active: bool,
    json: bool,
) -> Result<()> {
    let req = SetIsActiveRequest {
        user_id: UserId::new(user_id),
        is_active: active,
    };
    let body = client.post("/users/setIsActive", &req).await?.into_result()?;
    emit(body, json, |resp: UserResponse| {
        let u = resp.user;
        let flag = if u.is_active { "active" } else { "inactive" };
        println!("✓ {} ({}, team {}) is now {}", u.user_id, u.username, u.team_name, flag);
    })
}

async fn cmd_user_reviews(client: &ApiClient, user_id: &str, json: bool) -> Result<()> {
    let body = client
        .get("/users/getReview", &[("user_id", user_id)])
        .await?
        .into_result()?;
    emit(body, json, |reviews: AssignedPullRequests| {
        println!("Reviews assigned to {}:", reviews.user_id);
        if reviews.pull_requests.is_empty() {
            println!("  (none)");
        }
        for pr in &reviews.pull_requests {
            println!(
                "  {:<12} [{}] {} (by {})",
                pr.pull_request_id.as_str(), pr.status, pr.pull_request_name, pr.author_id
            );
        }
    })
}

async fn cmd_pr_create(
    client: &ApiClient,
    id: &str,
    name: String,
    author: &str,
    json: bool,
) -> Result<()> {
    let req = CreatePullRequestRequest {
        pull_request_id: PullRequestId::new(id),
        pull_request_name: name,
        author_id: UserId::new(author),
    };
    let body = client.post("/pullRequest/create", &req).await?.into_result()?;
    emit(body, json, |resp: PullRequestResponse| {
        println!("✓ Pull request opened");
        print_pull_request(&resp.pr);
    })
}

async fn cmd_pr_merge(client: &ApiClient, id: &str, json: bool) -> Result<()> {
    let req = MergePullRequestRequest {
        pull_request_id: PullRequestId::new(id),
    };
    let body = client.post("/pullRequest/merge", &req).await?.into_result()?;
    emit(body, json, |resp: PullRequestResponse| {
        println!("✓ Pull request merged");
        print_pull_request(&resp.pr);
    })
}

async fn cmd_pr_reassign(
    client: &ApiClient,
    id: &str,
    old_reviewer: &str,
    json: bool,
) -> Result<()> {
    let req = ReassignRequest {
        pull_request_id: PullRequestId::new(id),
        old_reviewer_id: UserId::new(old_reviewer),
    };
    let body = client
        .post("/pullRequest/reassign", &req)
        .await?
        .into_result()?;
    emit(body, json, |outcome: ReassignOutcome| {
        println!("✓ {} replaced by {}", old_reviewer, outcome.replaced_by);
        print_pull_request(&outcome.pr);
    })
}

async fn cmd_stats(client: &ApiClient, json: bool) -> Result<()> {
    let body = client.get("/stats", &[]).await?.into_result()?;
    emit(body, json, |stats: AppStats| {
        println!("Users:          {} ({} active)", stats.total_users_count, stats.active_users_count);
        println!("Teams:          {}", stats.total_teams_count);
        println!(
            "Pull requests:  {} open, {} merged",
            stats.opened_pull_requests_count, stats.merged_pull_requests_count
        );
        if !stats.users_count_by_team.is_empty() {
            println!("Users by team:");
            for t in &stats.users_count_by_team {
                println!("  {:<20} {}", t.team_name, t.user_count);
            }
        }
        if !stats.assignments_count_by_user.is_empty() {
            println!("Assignments by reviewer:");
            for r in &stats.assignments_count_by_user {
                println!("  {:<20} {}", r.user_id.as_str(), r.assignments_count);
            }
        }
    })
}

async fn cmd_loadtest(client: ApiClient, config: LoadTestConfig, json: bool) -> Result<()> {
    let report = loadtest::run(client, config).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{report}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn member_defaults_to_active() {
        let m = parse_member("u1:Alice").unwrap();
        assert_eq!(m.user_id.as_str(), "u1");
        assert_eq!(m.username, "Alice");
        assert!(m.is_active);
    }

    #[test]
    fn member_inactive_flag() {
        assert!(!parse_member("u2:Bob:inactive").unwrap().is_active);
    }

    #[test]
    fn member_rejects_malformed() {
        assert!(parse_member("u1").is_err());
        assert!(parse_member(":Alice").is_err());
        assert!(parse_member("u1:Alice:sleepy").is_err());
        assert!(parse_member("u1:Alice:inactive:x").is_err());
    }

    #[test]
    fn cli_parses_pr_create() {
        let cli = Cli::try_parse_from([
            "revassign",
            "--server",
            "http://example:9000",
            "pr",
            "create",
            "pr-1001",
            "Add search",
            "--author",
            "u1",
        ])
        .unwrap();
        assert_eq!(cli.server, "http://example:9000");
        match cli.command {
            Commands::Pr {
                action: PrAction::Create { id, name, author },
            } => {
                assert_eq!(id, "pr-1001");
                assert_eq!(name, "Add search");
                assert_eq!(author, "u1");
            }
            _ => panic!("expected pr create"),
        }
    }

    #[test]
    fn cli_parses_team_members() {
        let cli = Cli::try_parse_from([
            "revassign",
            "team",
            "add",
            "--name",
            "payments",
            "--member",
            "u1:Alice",
            "--member",
            "u2:Bob:inactive",
        ])
        .unwrap();
        match cli.command {
            Commands::Team {
                action: TeamAction::Add { name, members },
            } => {
                assert_eq!(name, "payments");
                assert_eq!(members.len(), 2);
                assert!(!members[1].is_active);
            }
            _ => panic!("expected team add"),
        }
    }

    #[test]
    fn cli_parses_set_active_false() {
        let cli =
            Cli::try_parse_from(["revassign", "user", "set-active", "u2", "--active", "false"])
                .unwrap();
        match cli.command {
            Commands::User {
                action: UserAction::SetActive { user_id, active },
            } => {
                assert_eq!(user_id, "u2");
                assert!(!active);
            }
            _ => panic!("expected user set-active"),
        }
    }

    #[test]
    fn loadtest_defaults_match_scenario() {
        let cli = Cli::try_parse_from(["revassign", "loadtest"]).unwrap();
        match cli.command {
            Commands::Loadtest {
                rate,
                duration_secs,
                workers,
                timeout_secs,
            } => {
                assert_eq!((rate, duration_secs, workers, timeout_secs), (5, 30, 20, 10));
            }
            _ => panic!("expected loadtest"),
        }
    }
}
