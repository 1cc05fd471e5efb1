//! SurrealDB schema migrations and initialization
//!
//! Defines the four revassign tables with their unique indexes. Every
//! statement is a `DEFINE ... IF NOT EXISTS`, so running it twice is harmless.

use crate::Result;
use surrealdb::engine::any::Any;
use surrealdb::Surreal;
use tracing::{debug, info};

/// Initialize all revassign tables in SurrealDB
///
/// Called once per connection by [`crate::SurrealHandle`].
pub async fn init_schema(db: &Surreal<Any>) -> Result<()> {
    info!("Initializing revassign SurrealDB schema");

    init_users_table(db).await?;
    init_teams_table(db).await?;
    init_pull_requests_table(db).await?;
    init_assigned_reviewers_table(db).await?;

    info!("revassign schema initialization complete");
    Ok(())
}

/// Initialize `users` table
///
/// Schema:
/// ```text
/// TABLE users {
///   user_id:    STRING (unique)
///   username:   STRING
///   team_name:  STRING (indexed)
///   is_active:  BOOL
/// }
/// ```
async fn init_users_table(db: &Surreal<Any>) -> Result<()> {
    debug!("Initializing users table");

    let sql = r#"
        DEFINE TABLE IF NOT EXISTS users
            SCHEMALESS
            PERMISSIONS
                FOR create FULL
                FOR select FULL
                FOR update FULL
                FOR delete NONE;

        DEFINE INDEX IF NOT EXISTS idx_user_id ON TABLE users COLUMNS user_id UNIQUE;

        -- Candidate queries filter on (team_name, is_active)
        DEFINE INDEX IF NOT EXISTS idx_team_active ON TABLE users COLUMNS team_name, is_active;
    "#;

    db.query(sql).await?.check()?;
    info!("✓ users table initialized");
    Ok(())
}

/// Initialize `teams` table
async fn init_teams_table(db: &Surreal<Any>) -> Result<()> {
    debug!("Initializing teams table");

    let sql = r#"
        DEFINE TABLE IF NOT EXISTS teams
            SCHEMALESS
            PERMISSIONS
                FOR create FULL
                FOR select FULL
                FOR update NONE
                FOR delete NONE;

        DEFINE INDEX IF NOT EXISTS idx_team_name ON TABLE teams COLUMNS name UNIQUE;
    "#;

    db.query(sql).await?.check()?;
    info!("✓ teams table initialized");
    Ok(())
}

/// Initialize `pull_requests` table
///
/// Schema:
/// ```text
/// TABLE pull_requests {
///   pull_request_id:    STRING (unique)
///   pull_request_name:  STRING
///   author_id:          STRING
///   status:             STRING (OPEN | MERGED)
///   created_at:         DATETIME
///   merged_at:          DATETIME?
/// }
/// ```
///
/// The OPEN -> MERGED transition is enforced by the engine, not here.
async fn init_pull_requests_table(db: &Surreal<Any>) -> Result<()> {
    debug!("Initializing pull_requests table");

    let sql = r#"
        DEFINE TABLE IF NOT EXISTS pull_requests
            SCHEMALESS
            PERMISSIONS
                FOR create FULL
                FOR select FULL
                FOR update FULL
                FOR delete NONE;

        DEFINE INDEX IF NOT EXISTS idx_pull_request_id ON TABLE pull_requests COLUMNS pull_request_id UNIQUE;

        DEFINE INDEX IF NOT EXISTS idx_pr_status ON TABLE pull_requests COLUMNS status;
    "#;

    db.query(sql).await?.check()?;
    info!("✓ pull_requests table initialized");
    Ok(())
}

/// Initialize `assigned_reviewers` table
///
/// One row per `(user_id, pull_request_id)` edge; the composite unique
/// index rejects duplicate edges.
async fn init_assigned_reviewers_table(db: &Surreal<Any>) -> Result<()> {
    debug!("Initializing assigned_reviewers table");

    let sql = r#"
        DEFINE TABLE IF NOT EXISTS assigned_reviewers
            SCHEMALESS
            PERMISSIONS
                FOR create FULL
                FOR select FULL
                FOR update NONE
                FOR delete FULL;

        DEFINE INDEX IF NOT EXISTS idx_assignment_pair ON TABLE assigned_reviewers COLUMNS user_id, pull_request_id UNIQUE;

        DEFINE INDEX IF NOT EXISTS idx_assignment_pr ON TABLE assigned_reviewers COLUMNS pull_request_id;
    "#;

    db.query(sql).await?.check()?;
    info!("✓ assigned_reviewers table initialized");
    Ok(())
}
