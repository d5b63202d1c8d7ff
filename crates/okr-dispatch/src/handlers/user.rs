//! User intents

use super::common::{Keys, Turn};
use super::team::TEAM;
use crate::collaborators::{Invitation, TeamQuery, TeamService, UserQuery, UserService};
use crate::envelope::ResultEnvelope;
use crate::handler::{IntentHandler, IntentKind, IntentSet};
use crate::memory::ConversationMemory;
use crate::params::ParameterBag;
use crate::types::{ConversationContext, EntityId, EntityType, Operation, Role};
use async_trait::async_trait;
use std::sync::Arc;

pub(crate) const USER: Keys = Keys {
    entity: EntityType::User,
    id: "userId",
    titles: &["email", "userEmail", "userName"],
    hint: "email",
};

const USER_TEAM: Keys = Keys {
    titles: &["teamName"],
    ..TEAM
};

/// Intents owned by [`UserHandler`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UserIntent {
    Invite,
    GetInfo,
    Search,
    GetAll,
    UpdateRole,
}

impl IntentKind for UserIntent {
    const ALL: &'static [Self] = &[
        Self::Invite,
        Self::GetInfo,
        Self::Search,
        Self::GetAll,
        Self::UpdateRole,
    ];

    fn name(self) -> &'static str {
        match self {
            Self::Invite => "InviteUser",
            Self::GetInfo => "GetUserInfo",
            Self::Search => "SearchUsers",
            Self::GetAll => "GetAllUsers",
            Self::UpdateRole => "UpdateUserRole",
        }
    }
}

/// Handles user intents
pub struct UserHandler {
    users: Arc<dyn UserService>,
    teams: Arc<dyn TeamService>,
    memory: ConversationMemory,
    intents: IntentSet,
}

impl UserHandler {
    /// Create handler
    ///
    /// `teams` resolves a team name given with an invitation.
    #[must_use]
    pub fn new(users: Arc<dyn UserService>, teams: Arc<dyn TeamService>, memory: ConversationMemory) -> Self {
        Self {
            users,
            teams,
            memory,
            intents: IntentSet::of::<UserIntent>(),
        }
    }

    async fn invitation_team(&self, turn: &Turn<'_>) -> Option<EntityId> {
        if let Some(id) = turn.params().get_id(USER_TEAM.id) {
            return Some(id);
        }
        let name = turn.params().first_text(USER_TEAM.titles)?;
        let query = TeamQuery {
            keyword: Some(name.to_string()),
        };
        let outcome = self.teams.search_teams(turn.user(), query).await;
        turn.pick_match(name, outcome)
    }

    async fn invite(&self, turn: &Turn<'_>) -> ResultEnvelope {
        let Some(email) = turn.params().first_text(&["email", "userEmail"]) else {
            return turn.missing(EntityType::User, Operation::Invite, "email");
        };
        let invitation = Invitation {
            email: email.to_string(),
            first_name: turn.text("firstName"),
            last_name: turn.text("lastName"),
            role: turn.params().get_enum::<Role>("role"),
            team_id: self.invitation_team(turn).await,
        };
        let outcome = self.users.invite_user(turn.user(), invitation).await;
        turn.settle(Operation::Invite, outcome).await
    }

    async fn update_role(&self, turn: &Turn<'_>) -> ResultEnvelope {
        let Some(role) = turn.params().get_enum::<Role>("role") else {
            return turn.missing(EntityType::User, Operation::Update, "role");
        };
        turn.on_target(&USER, Operation::Update, |target| {
            self.users.update_role(turn.user(), target, role)
        })
        .await
    }
}

#[async_trait]
impl IntentHandler for UserHandler {
    fn name(&self) -> &'static str {
        "user"
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
        let Some(kind) = UserIntent::from_name(intent) else {
            return ResultEnvelope::unrouted(intent);
        };
        let turn = Turn::new(&self.memory, conversation, intent, params);
        let user = turn.user();

        match kind {
            UserIntent::Invite => self.invite(&turn).await,
            UserIntent::GetInfo => {
                turn.on_target(&USER, Operation::View, |target| self.users.get_user(user, target))
                    .await
            }
            UserIntent::Search => {
                let query = UserQuery {
                    keyword: turn.keyword(),
                    role: params.get_enum::<Role>("role"),
                    team: turn.explicit(&USER_TEAM),
                };
                let outcome = self.users.search_users(user, query).await;
                turn.settle_listing(outcome).await
            }
            UserIntent::GetAll => {
                let outcome = self.users.search_users(user, UserQuery::default()).await;
                turn.settle_listing(outcome).await
            }
            UserIntent::UpdateRole => self.update_role(&turn).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::{Listing, MockTeamService, MockUserService, TeamDto, UserDto};
    use crate::error::ErrorKind;
    use crate::types::{EntityLocator, UserContext};

    fn person(id: &str, email: &str, role: Role) -> UserDto {
        UserDto {
            user_id: EntityId::new(id),
            email: email.to_string(),
            first_name: None,
            last_name: None,
            role,
            team_id: None,
            prompt_template: String::new(),
        }
    }

    fn team(id: &str, name: &str) -> TeamDto {
        TeamDto {
            team_id: EntityId::new(id),
            name: name.to_string(),
            description: None,
            color: None,
            member_ids: Vec::new(),
            prompt_template: String::new(),
        }
    }

    fn context() -> ConversationContext {
        ConversationContext::new("c1", UserContext::new("u1", "org1", Role::Admin))
    }

    #[tokio::test]
    async fn invite_resolves_team_name() {
        let mut teams = MockTeamService::new();
        teams
            .expect_search_teams()
            .withf(|_, query| query.keyword.as_deref() == Some("Core"))
            .times(1)
            .returning(|_, _| Ok(Listing::new(vec![team("t1", "Core"), team("t2", "Core Ops")], "")));

        let mut users = MockUserService::new();
        users
            .expect_invite_user()
            .withf(|_, invitation| {
                invitation.email == "ada@example.com"
                    && invitation.team_id == Some(EntityId::new("t1"))
                    && invitation.role == Some(Role::Manager)
            })
            .times(1)
            .returning(|_, _| Ok(person("u7", "ada@example.com", Role::Manager)));

        let memory = ConversationMemory::default();
        let handler = UserHandler::new(Arc::new(users), Arc::new(teams), memory.clone());
        let ctx = context();
        let params = ParameterBag::new()
            .with("email", "ada@example.com")
            .with("teamName", "Core")
            .with("role", "manager");

        let env = handler.handle(&ctx, "InviteUser", &params).await;

        assert!(env.success);
        assert_eq!(env.operation, Some(Operation::Invite));
        assert_eq!(env.message, "Invited 'ada@example.com'.");
        assert_eq!(
            memory.recall(&ctx.conversation_id, EntityType::User).await,
            Some(EntityId::new("u7"))
        );
    }

    #[tokio::test]
    async fn invite_without_email_is_guidance() {
        let handler = UserHandler::new(
            Arc::new(MockUserService::new()),
            Arc::new(MockTeamService::new()),
            ConversationMemory::default(),
        );
        let env = handler
            .handle(&context(), "InviteUser", &ParameterBag::new().with("firstName", "Ada"))
            .await;

        assert_eq!(env.error_kind, Some(ErrorKind::Guidance));
        assert_eq!(env.message, "Please provide an email for the user.");
        assert_eq!(env.operation, Some(Operation::Invite));
    }

    #[tokio::test]
    async fn update_role_requires_a_role() {
        let handler = UserHandler::new(
            Arc::new(MockUserService::new()),
            Arc::new(MockTeamService::new()),
            ConversationMemory::default(),
        );
        let env = handler
            .handle(&context(), "UpdateUserRole", &ParameterBag::new().with("email", "ada@example.com"))
            .await;

        assert_eq!(env.message, "Please provide a role for the user.");
    }

    #[tokio::test]
    async fn update_role_recalls_user() {
        let memory = ConversationMemory::default();
        let ctx = context();
        memory
            .remember(&ctx.conversation_id, EntityType::User, EntityId::new("u7"))
            .await;

        let mut users = MockUserService::new();
        users
            .expect_update_role()
            .withf(|_, target, role| *target == EntityLocator::by_id("u7") && *role == Role::Viewer)
            .times(1)
            .returning(|_, _, role| Ok(person("u7", "ada@example.com", role)));

        let handler = UserHandler::new(Arc::new(users), Arc::new(MockTeamService::new()), memory);
        let env = handler
            .handle(&ctx, "UpdateUserRole", &ParameterBag::new().with("role", "viewer"))
            .await;

        assert!(env.success);
        assert_eq!(env.payload["role"], "Viewer");
    }

    #[tokio::test]
    async fn search_filters_by_role() {
        let mut users = MockUserService::new();
        users
            .expect_search_users()
            .withf(|_, query| query.role == Some(Role::Admin) && query.keyword.as_deref() == Some("ada"))
            .returning(|_, _| Ok(Listing::new(Vec::new(), "")));

        let handler = UserHandler::new(Arc::new(users), Arc::new(MockTeamService::new()), ConversationMemory::default());
        let params = ParameterBag::new().with("query", "ada").with("role", "admin");
        let env = handler.handle(&context(), "SearchUsers", &params).await;

        assert!(env.success);
        assert_eq!(env.entity_id, None);
        assert_eq!(env.message, "Found 0 users.");
    }
}
