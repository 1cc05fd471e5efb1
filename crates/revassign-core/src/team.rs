//! Team roster flows.

use revassign_state::{Stores, Team, User};
use tracing::instrument;

use crate::domain::{AssignmentError, Result, TeamMember, TeamRoster};
use crate::obs;

#[derive(Clone)]
pub struct TeamService {
    stores: Stores,
}

impl TeamService {
    pub fn new(stores: Stores) -> Self {
        Self { stores }
    }

    /// Create a team and upsert its members.
    ///
    /// A member whose id already exists anywhere is moved into this team and
    /// has username and activity overwritten. Member write failures are
    /// logged and do not fail the call.
    #[instrument(skip(self, roster), fields(team_name = %roster.team_name, members = roster.members.len()))]
    pub async fn add_team(&self, roster: TeamRoster) -> Result<TeamRoster> {
        if self.stores.teams.team_exists(&roster.team_name).await? {
            return Err(AssignmentError::TeamExists {
                team_name: roster.team_name,
            });
        }

        self.stores
            .teams
            .save_team(&Team::new(roster.team_name.clone()))
            .await
            .map_err(|e| match e {
                revassign_state::StorageError::Duplicate { id, .. } => {
                    AssignmentError::TeamExists { team_name: id }
                }
                other => other.into(),
            })?;

        for member in &roster.members {
            if let Err(e) = self.upsert_member(&roster.team_name, member).await {
                obs::emit_member_write_failed(&roster.team_name, member.user_id.as_str(), &e);
            }
        }

        obs::emit_team_added(&roster.team_name, roster.members.len());
        Ok(roster)
    }

    async fn upsert_member(
        &self,
        team_name: &str,
        member: &TeamMember,
    ) -> revassign_state::StorageResult<()> {
        let user = User {
            user_id: member.user_id.clone(),
            username: member.username.clone(),
            team_name: team_name.to_string(),
            is_active: member.is_active,
        };
        if self.stores.users.user_exists(&user.user_id).await? {
            self.stores.users.update_user(&user).await
        } else {
            self.stores.users.save_user(&user).await
        }
    }

    /// Team with its members, derived from the user directory.
    #[instrument(skip(self))]
    pub async fn get_team(&self, team_name: &str) -> Result<TeamRoster> {
        let team = self
            .stores
            .teams
            .get_team(team_name)
            .await?
            .ok_or_else(|| AssignmentError::team_not_found(team_name))?;

        let members = self
            .stores
            .users
            .get_team_members(&team.name)
            .await?
            .into_iter()
            .map(TeamMember::from)
            .collect();

        Ok(TeamRoster {
            team_name: team.name,
            members,
        })
    }
}
