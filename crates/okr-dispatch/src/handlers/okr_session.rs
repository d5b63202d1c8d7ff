//! OKR session intents

use super::common::{Keys, Turn};
use super::team::TEAM;
use crate::collaborators::{OkrSessionChanges, OkrSessionDraft, OkrSessionQuery, OkrSessionService};
use crate::envelope::ResultEnvelope;
use crate::handler::{IntentHandler, IntentKind, IntentSet};
use crate::memory::ConversationMemory;
use crate::params::ParameterBag;
use crate::types::{ConversationContext, EntityType, Operation};
use async_trait::async_trait;
use std::sync::Arc;

const SESSION: Keys = Keys {
    entity: EntityType::OkrSession,
    id: "okrSessionId",
    titles: &["title", "okrSessionTitle"],
    hint: "title",
};

const PARENT_TEAM: Keys = Keys {
    titles: &["teamName"],
    ..TEAM
};

/// Intents owned by [`OkrSessionHandler`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OkrSessionIntent {
    Create,
    Update,
    Delete,
    GetInfo,
    Search,
    GetAll,
}

impl IntentKind for OkrSessionIntent {
    const ALL: &'static [Self] = &[
        Self::Create,
        Self::Update,
        Self::Delete,
        Self::GetInfo,
        Self::Search,
        Self::GetAll,
    ];

    fn name(self) -> &'static str {
        match self {
            Self::Create => "CreateOkrSession",
            Self::Update => "UpdateOkrSession",
            Self::Delete => "DeleteOkrSession",
            Self::GetInfo => "GetOkrSessionInfo",
            Self::Search => "SearchOkrSessions",
            Self::GetAll => "GetAllOkrSessions",
        }
    }
}

/// Handles OKR session intents
pub struct OkrSessionHandler {
    sessions: Arc<dyn OkrSessionService>,
    memory: ConversationMemory,
    intents: IntentSet,
}

impl OkrSessionHandler {
    /// Create handler
    #[must_use]
    pub fn new(sessions: Arc<dyn OkrSessionService>, memory: ConversationMemory) -> Self {
        Self {
            sessions,
            memory,
            intents: IntentSet::of::<OkrSessionIntent>(),
        }
    }
}

#[async_trait]
impl IntentHandler for OkrSessionHandler {
    fn name(&self) -> &'static str {
        "okr_session"
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
        let Some(kind) = OkrSessionIntent::from_name(intent) else {
            return ResultEnvelope::unrouted(intent);
        };
        let turn = Turn::new(&self.memory, conversation, intent, params);
        let user = turn.user();

        match kind {
            OkrSessionIntent::Create => {
                let Some(title) = params.first_text(SESSION.titles) else {
                    return turn.missing(EntityType::OkrSession, Operation::Create, "title");
                };
                let draft = OkrSessionDraft {
                    title: title.to_string(),
                    description: turn.text("description"),
                    team: turn.locate(&PARENT_TEAM).await,
                    schedule: turn.schedule(),
                };
                let outcome = self.sessions.create_session(user, draft).await;
                turn.settle(Operation::Create, outcome).await
            }
            OkrSessionIntent::Update => {
                let changes = OkrSessionChanges {
                    new_title: turn.text("newTitle"),
                    description: turn.text("description"),
                    schedule: turn.schedule(),
                };
                turn.on_target(&SESSION, Operation::Update, |target| {
                    self.sessions.update_session(user, target, changes)
                })
                .await
            }
            OkrSessionIntent::Delete => {
                turn.on_target(&SESSION, Operation::Delete, |target| {
                    self.sessions.delete_session(user, target)
                })
                .await
            }
            OkrSessionIntent::GetInfo => {
                turn.on_target(&SESSION, Operation::View, |target| self.sessions.get_session(user, target))
                    .await
            }
            OkrSessionIntent::Search => {
                let query = OkrSessionQuery {
                    keyword: turn.keyword(),
                    status: turn.schedule().status,
                    team: turn.explicit(&PARENT_TEAM),
                };
                let outcome = self.sessions.search_sessions(user, query).await;
                turn.settle_listing(outcome).await
            }
            OkrSessionIntent::GetAll => {
                let outcome = self
                    .sessions
                    .search_sessions(user, OkrSessionQuery::default())
                    .await;
                turn.settle_listing(outcome).await
            }
        }
    }
}
