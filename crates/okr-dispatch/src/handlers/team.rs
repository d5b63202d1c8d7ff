//! Team intents, including membership changes

use super::common::{Keys, Turn};
use super::user::USER;
use crate::collaborators::{TeamChanges, TeamDraft, TeamQuery, TeamService};
use crate::envelope::ResultEnvelope;
use crate::handler::{IntentHandler, IntentKind, IntentSet};
use crate::memory::ConversationMemory;
use crate::params::ParameterBag;
use crate::types::{ConversationContext, EntityType, Operation};
use async_trait::async_trait;
use std::sync::Arc;

pub(crate) const TEAM: Keys = Keys {
    entity: EntityType::Team,
    id: "teamId",
    titles: &["teamName", "name"],
    hint: "name",
};

/// Intents owned by [`TeamHandler`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TeamIntent {
    Create,
    Update,
    Delete,
    GetInfo,
    Search,
    GetAll,
    AddMember,
    RemoveMember,
}

impl IntentKind for TeamIntent {
    const ALL: &'static [Self] = &[
        Self::Create,
        Self::Update,
        Self::Delete,
        Self::GetInfo,
        Self::Search,
        Self::GetAll,
        Self::AddMember,
        Self::RemoveMember,
    ];

    fn name(self) -> &'static str {
        match self {
            Self::Create => "CreateTeam",
            Self::Update => "UpdateTeam",
            Self::Delete => "DeleteTeam",
            Self::GetInfo => "GetTeamInfo",
            Self::Search => "SearchTeams",
            Self::GetAll => "GetAllTeams",
            Self::AddMember => "AddTeamMember",
            Self::RemoveMember => "RemoveTeamMember",
        }
    }
}

/// Handles team intents
pub struct TeamHandler {
    teams: Arc<dyn TeamService>,
    memory: ConversationMemory,
    intents: IntentSet,
}

impl TeamHandler {
    /// Create handler
    #[must_use]
    pub fn new(teams: Arc<dyn TeamService>, memory: ConversationMemory) -> Self {
        Self {
            teams,
            memory,
            intents: IntentSet::of::<TeamIntent>(),
        }
    }

    async fn create(&self, turn: &Turn<'_>) -> ResultEnvelope {
        let Some(name) = turn.params().first_text(TEAM.titles) else {
            return turn.missing(EntityType::Team, Operation::Create, "name");
        };
        let draft = TeamDraft {
            name: name.to_string(),
            description: turn.text("description"),
            color: turn.text("color"),
        };
        let outcome = self.teams.create_team(turn.user(), draft).await;
        turn.settle(Operation::Create, outcome).await
    }

    /// Membership change: both the team and the member must resolve
    async fn membership(&self, turn: &Turn<'_>, adding: bool) -> ResultEnvelope {
        let Some(team) = turn.locate(&TEAM).await else {
            return turn.which(&TEAM, Operation::Update);
        };
        let Some(member) = turn.locate(&USER).await else {
            return turn.which(&USER, Operation::Update);
        };
        let user = turn.user();
        let outcome = if adding {
            self.teams.add_member(user, team, member).await
        } else {
            self.teams.remove_member(user, team, member).await
        };
        turn.settle(Operation::Update, outcome).await
    }
}

#[async_trait]
impl IntentHandler for TeamHandler {
    fn name(&self) -> &'static str {
        "team"
    }

    fn intents(&self) -> &IntentSet {
        &self.intents
    }

    async fn handle(
        &self,
        conversation: &ConversationContext,
        intent: &str,
        params: &ParameterBag,
    ) -> ResultEnvelope {
        let Some(kind) = TeamIntent::from_name(intent) else {
            return ResultEnvelope::unrouted(intent);
        };
        let turn = Turn::new(&self.memory, conversation, intent, params);
        let user = turn.user();

        match kind {
            TeamIntent::Create => self.create(&turn).await,
            TeamIntent::Update => {
                let changes = TeamChanges {
                    new_name: turn.text("newName"),
                    description: turn.text("description"),
                    color: turn.text("color"),
                };
                turn.on_target(&TEAM, Operation::Update, |target| {
                    self.teams.update_team(user, target, changes)
                })
                .await
            }
            TeamIntent::Delete => {
                turn.on_target(&TEAM, Operation::Delete, |target| self.teams.delete_team(user, target))
                    .await
            }
            TeamIntent::GetInfo => {
                turn.on_target(&TEAM, Operation::View, |target| self.teams.get_team(user, target))
                    .await
            }
            TeamIntent::Search => {
                let query = TeamQuery {
                    keyword: turn.keyword(),
                };
                let outcome = self.teams.search_teams(user, query).await;
                turn.settle_listing(outcome).await
            }
            TeamIntent::GetAll => {
                let outcome = self.teams.search_teams(user, TeamQuery::default()).await;
                turn.settle_listing(outcome).await
            }
            TeamIntent::AddMember => self.membership(&turn, true).await,
            TeamIntent::RemoveMember => self.membership(&turn, false).await,
        }
    }
}
