//! Objective intents

use super::common::{Keys, Turn};
use crate::collaborators::{ObjectiveChanges, ObjectiveDraft, ObjectiveQuery, ObjectiveService};
use crate::envelope::ResultEnvelope;
use crate::handler::{IntentHandler, IntentKind, IntentSet};
use crate::memory::ConversationMemory;
use crate::params::ParameterBag;
use crate::types::{ConversationContext, EntityType, Operation};
use async_trait::async_trait;
use std::sync::Arc;

const OBJECTIVE: Keys = Keys {
    entity: EntityType::Objective,
    id: "objectiveId",
    titles: &["title", "objectiveTitle"],
    hint: "title",
};

const PARENT_SESSION: Keys = Keys {
    entity: EntityType::OkrSession,
    id: "okrSessionId",
    titles: &["okrSessionTitle"],
    hint: "title",
};

/// Intents owned by [`ObjectiveHandler`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectiveIntent {
    Create,
    Update,
    Delete,
    GetInfo,
    Search,
    BySession,
    GetAll,
}

impl IntentKind for ObjectiveIntent {
    const ALL: &'static [Self] = &[
        Self::Create,
        Self::Update,
        Self::Delete,
        Self::GetInfo,
        Self::Search,
        Self::BySession,
        Self::GetAll,
    ];

    fn name(self) -> &'static str {
        match self {
            Self::Create => "CreateObjective",
            Self::Update => "UpdateObjective",
            Self::Delete => "DeleteObjective",
            Self::GetInfo => "GetObjectiveInfo",
            Self::Search => "SearchObjectives",
            Self::BySession => "GetObjectivesBySession",
            Self::GetAll => "GetAllObjectives",
        }
    }
}

/// Handles objective intents
pub struct ObjectiveHandler {
    objectives: Arc<dyn ObjectiveService>,
    memory: ConversationMemory,
    intents: IntentSet,
}

impl ObjectiveHandler {
    /// Create handler
    #[must_use]
    pub fn new(objectives: Arc<dyn ObjectiveService>, memory: ConversationMemory) -> Self {
        Self {
            objectives,
            memory,
            intents: IntentSet::of::<ObjectiveIntent>(),
        }
    }

    async fn create(&self, turn: &Turn<'_>) -> ResultEnvelope {
        let Some(title) = turn.params().first_text(OBJECTIVE.titles) else {
            return turn.missing(EntityType::Objective, Operation::Create, "title");
        };
        let draft = ObjectiveDraft {
            title: title.to_string(),
            description: turn.text("description"),
            okr_session: turn.locate(&PARENT_SESSION).await,
            schedule: turn.schedule(),
        };
        let outcome = self.objectives.create_objective(turn.user(), draft).await;
        turn.settle(Operation::Create, outcome).await
    }

    async fn update(&self, turn: &Turn<'_>) -> ResultEnvelope {
        let changes = ObjectiveChanges {
            new_title: turn.text("newTitle"),
            description: turn.text("description"),
            schedule: turn.schedule(),
        };
        turn.on_target(&OBJECTIVE, Operation::Update, |target| {
            self.objectives.update_objective(turn.user(), target, changes)
        })
        .await
    }

    async fn by_session(&self, turn: &Turn<'_>) -> ResultEnvelope {
        let Some(session) = turn.locate(&PARENT_SESSION).await else {
            return turn.which(&PARENT_SESSION, Operation::Search);
        };
        let query = ObjectiveQuery {
            okr_session: Some(session),
            ..ObjectiveQuery::default()
        };
        let outcome = self.objectives.search_objectives(turn.user(), query).await;
        turn.settle_listing(outcome).await
    }
}

#[async_trait]
impl IntentHandler for ObjectiveHandler {
    fn name(&self) -> &'static str {
        "objective"
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
        let Some(kind) = ObjectiveIntent::from_name(intent) else {
            return ResultEnvelope::unrouted(intent);
        };
        let turn = Turn::new(&self.memory, conversation, intent, params);
        let user = turn.user();

        match kind {
            ObjectiveIntent::Create => self.create(&turn).await,
            ObjectiveIntent::Update => self.update(&turn).await,
            ObjectiveIntent::Delete => {
                turn.on_target(&OBJECTIVE, Operation::Delete, |target| {
                    self.objectives.delete_objective(user, target)
                })
                .await
            }
            ObjectiveIntent::GetInfo => {
                turn.on_target(&OBJECTIVE, Operation::View, |target| {
                    self.objectives.get_objective(user, target)
                })
                .await
            }
            ObjectiveIntent::Search => {
                let query = ObjectiveQuery {
                    keyword: turn.keyword(),
                    status: turn.schedule().status,
                    okr_session: turn.explicit(&PARENT_SESSION),
                };
                let outcome = self.objectives.search_objectives(user, query).await;
                turn.settle_listing(outcome).await
            }
            ObjectiveIntent::BySession => self.by_session(&turn).await,
            ObjectiveIntent::GetAll => {
                let outcome = self
                    .objectives
                    .search_objectives(user, ObjectiveQuery::default())
                    .await;
                turn.settle_listing(outcome).await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::{Listing, MockObjectiveService, ObjectiveDto, Status};
    use crate::error::{CollaboratorError, ErrorKind};
    use crate::types::{EntityId, EntityLocator, Role, UserContext};

    fn dto(id: &str, title: &str) -> ObjectiveDto {
        ObjectiveDto {
            objective_id: EntityId::new(id),
            title: title.to_string(),
            description: None,
            okr_session_id: None,
            status: Status::InProgress,
            progress: 10.0,
            start_date: None,
            end_date: None,
            prompt_template: String::new(),
        }
    }

    fn context() -> ConversationContext {
        ConversationContext::new("c1", UserContext::new("u1", "org1", Role::Admin))
    }

    #[tokio::test]
    async fn create_populates_memory() {
        let mut mock = MockObjectiveService::new();
        mock.expect_create_objective()
            .withf(|_, draft| draft.title == "Grow revenue" && draft.okr_session.is_none())
            .times(1)
            .returning(|_, _| Ok(dto("o42", "Grow revenue")));

        let memory = ConversationMemory::default();
        let handler = ObjectiveHandler::new(Arc::new(mock), memory.clone());
        let ctx = context();

        let env = handler
            .handle(&ctx, "CreateObjective", &ParameterBag::new().with("title", "Grow revenue"))
            .await;

        assert!(env.success);
        assert_eq!(env.entity_type, Some(EntityType::Objective));
        assert_eq!(env.message, "Created objective 'Grow revenue'.");
        assert_eq!(
            memory.recall(&ctx.conversation_id, EntityType::Objective).await,
            Some(EntityId::new("o42"))
        );
    }

    #[tokio::test]
    async fn view_uses_explicit_guid() {
        let id = "6f9619ff-8b86-d011-b42d-00c04fc964ff";
        let mut mock = MockObjectiveService::new();
        mock.expect_get_objective()
            .withf(move |_, target| target.id == Some(EntityId::new(id)))
            .returning(move |_, _| Ok(dto(id, "Grow revenue")));

        let handler = ObjectiveHandler::new(Arc::new(mock), ConversationMemory::default());
        let env = handler
            .handle(&context(), "GetObjectiveInfo", &ParameterBag::new().with("objectiveId", id))
            .await;

        assert!(env.success);
        assert_eq!(env.operation, Some(Operation::View));
    }

    #[tokio::test]
    async fn malformed_guid_falls_back_to_memory() {
        let memory = ConversationMemory::default();
        let ctx = context();
        memory
            .remember(&ctx.conversation_id, EntityType::Objective, EntityId::new("o1"))
            .await;

        let mut mock = MockObjectiveService::new();
        mock.expect_delete_objective()
            .withf(|_, target| *target == EntityLocator::by_id("o1"))
            .returning(|_, _| Ok(dto("o1", "Old")));

        let handler = ObjectiveHandler::new(Arc::new(mock), memory);
        let env = handler
            .handle(&ctx, "DeleteObjective", &ParameterBag::new().with("objectiveId", "not-a-guid"))
            .await;

        assert!(env.success);
        assert_eq!(env.operation, Some(Operation::Delete));
    }

    #[tokio::test]
    async fn validation_errors_pass_message_through() {
        let mut mock = MockObjectiveService::new();
        mock.expect_update_objective()
            .returning(|_, _, _| Err(CollaboratorError::validation("End date must be after the start date.")));

        let handler = ObjectiveHandler::new(Arc::new(mock), ConversationMemory::default());
        let env = handler
            .handle(&context(), "UpdateObjective", &ParameterBag::new().with("title", "Grow revenue"))
            .await;

        assert_eq!(env.error_kind, Some(ErrorKind::Validation));
        assert_eq!(env.message, "End date must be after the start date.");
    }

    #[tokio::test]
    async fn by_session_uses_recalled_session() {
        let memory = ConversationMemory::default();
        let ctx = context();
        memory
            .remember(&ctx.conversation_id, EntityType::OkrSession, EntityId::new("s1"))
            .await;

        let mut mock = MockObjectiveService::new();
        mock.expect_search_objectives()
            .withf(|_, query| query.okr_session == Some(EntityLocator::by_id("s1")))
            .returning(|_, _| Ok(Listing::new(vec![dto("o1", "A"), dto("o2", "B")], "Two objectives.")));

        let handler = ObjectiveHandler::new(Arc::new(mock), memory);
        let env = handler.handle(&ctx, "GetObjectivesBySession", &ParameterBag::new()).await;

        assert!(env.success);
        assert_eq!(env.operation, Some(Operation::Search));
        assert_eq!(env.entity_id, None);
        assert_eq!(env.message, "Two objectives.");
    }
}
