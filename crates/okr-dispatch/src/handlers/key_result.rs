//! Key result intents

use super::common::{Keys, Turn};
use crate::collaborators::{KeyResultChanges, KeyResultDraft, KeyResultQuery, KeyResultService};
use crate::envelope::ResultEnvelope;
use crate::handler::{IntentHandler, IntentKind, IntentSet};
use crate::memory::ConversationMemory;
use crate::params::ParameterBag;
use crate::types::{ConversationContext, EntityType, Operation};
use async_trait::async_trait;
use std::sync::Arc;

pub(crate) const KEY_RESULT: Keys = Keys {
    entity: EntityType::KeyResult,
    id: "keyResultId",
    titles: &["title", "keyResultTitle"],
    hint: "title",
};

const PARENT_OBJECTIVE: Keys = Keys {
    entity: EntityType::Objective,
    id: "objectiveId",
    titles: &["objectiveTitle"],
    hint: "title",
};

/// Intents owned by [`KeyResultHandler`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyResultIntent {
    Create,
    Update,
    Delete,
    GetInfo,
    Search,
    ByObjective,
    GetAll,
}

impl IntentKind for KeyResultIntent {
    const ALL: &'static [Self] = &[
        Self::Create,
        Self::Update,
        Self::Delete,
        Self::GetInfo,
        Self::Search,
        Self::ByObjective,
        Self::GetAll,
    ];

    fn name(self) -> &'static str {
        match self {
            Self::Create => "CreateKeyResult",
            Self::Update => "UpdateKeyResult",
            Self::Delete => "DeleteKeyResult",
            Self::GetInfo => "GetKeyResultInfo",
            Self::Search => "SearchKeyResults",
            Self::ByObjective => "GetKeyResultsByObjective",
            Self::GetAll => "GetAllKeyResults",
        }
    }
}

/// Handles key result intents
pub struct KeyResultHandler {
    key_results: Arc<dyn KeyResultService>,
    memory: ConversationMemory,
    intents: IntentSet,
}

impl KeyResultHandler {
    /// Create handler
    #[must_use]
    pub fn new(key_results: Arc<dyn KeyResultService>, memory: ConversationMemory) -> Self {
        Self {
            key_results,
            memory,
            intents: IntentSet::of::<KeyResultIntent>(),
        }
    }

    async fn create(&self, turn: &Turn<'_>) -> ResultEnvelope {
        let Some(title) = turn.params().first_text(KEY_RESULT.titles) else {
            return turn.missing(EntityType::KeyResult, Operation::Create, "title");
        };
        let draft = KeyResultDraft {
            title: title.to_string(),
            description: turn.text("description"),
            objective: turn.locate(&PARENT_OBJECTIVE).await,
            schedule: turn.schedule(),
        };
        let outcome = self.key_results.create_key_result(turn.user(), draft).await;
        turn.settle(Operation::Create, outcome).await
    }

    async fn update(&self, turn: &Turn<'_>) -> ResultEnvelope {
        let changes = KeyResultChanges {
            new_title: turn.text("newTitle"),
            description: turn.text("description"),
            schedule: turn.schedule(),
        };
        turn.on_target(&KEY_RESULT, Operation::Update, |target| {
            self.key_results.update_key_result(turn.user(), target, changes)
        })
        .await
    }

    async fn by_objective(&self, turn: &Turn<'_>) -> ResultEnvelope {
        let Some(objective) = turn.locate(&PARENT_OBJECTIVE).await else {
            return turn.which(&PARENT_OBJECTIVE, Operation::Search);
        };
        let query = KeyResultQuery {
            objective: Some(objective),
            ..KeyResultQuery::default()
        };
        let outcome = self.key_results.search_key_results(turn.user(), query).await;
        turn.settle_listing(outcome).await
    }

    async fn search(&self, turn: &Turn<'_>) -> ResultEnvelope {
        let query = KeyResultQuery {
            keyword: turn.keyword(),
            status: turn.schedule().status,
            objective: turn.explicit(&PARENT_OBJECTIVE),
        };
        let outcome = self.key_results.search_key_results(turn.user(), query).await;
        turn.settle_listing(outcome).await
    }
}

#[async_trait]
impl IntentHandler for KeyResultHandler {
    fn name(&self) -> &'static str {
        "key_result"
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
        let Some(kind) = KeyResultIntent::from_name(intent) else {
            return ResultEnvelope::unrouted(intent);
        };
        let turn = Turn::new(&self.memory, conversation, intent, params);
        let user = turn.user();

        match kind {
            KeyResultIntent::Create => self.create(&turn).await,
            KeyResultIntent::Update => self.update(&turn).await,
            KeyResultIntent::Delete => {
                turn.on_target(&KEY_RESULT, Operation::Delete, |target| {
                    self.key_results.delete_key_result(user, target)
                })
                .await
            }
            KeyResultIntent::GetInfo => {
                turn.on_target(&KEY_RESULT, Operation::View, |target| {
                    self.key_results.get_key_result(user, target)
                })
                .await
            }
            KeyResultIntent::Search => self.search(&turn).await,
            KeyResultIntent::ByObjective => self.by_objective(&turn).await,
            KeyResultIntent::GetAll => {
                let outcome = self
                    .key_results
                    .search_key_results(user, KeyResultQuery::default())
                    .await;
                turn.settle_listing(outcome).await
            }
        }
    }
}
