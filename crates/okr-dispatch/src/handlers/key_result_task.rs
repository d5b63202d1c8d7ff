//! Key result task intents
//!
//! Tasks hang off a key result and may be assigned to a collaborator. The
//! collaborator can be named by id or by name; a name is resolved through the
//! user directory before the task service is called.

use super::common::{Keys, Turn};
use super::key_result::KEY_RESULT;
use crate::collaborators::{
    KeyResultTaskChanges, KeyResultTaskDraft, KeyResultTaskQuery, KeyResultTaskService, Priority, UserQuery,
    UserService,
};
use crate::envelope::ResultEnvelope;
use crate::handler::{IntentHandler, IntentKind, IntentSet};
use crate::memory::ConversationMemory;
use crate::params::ParameterBag;
use crate::types::{ConversationContext, EntityId, EntityType, Operation};
use async_trait::async_trait;
use std::sync::Arc;

const TASK: Keys = Keys {
    entity: EntityType::KeyResultTask,
    id: "keyResultTaskId",
    titles: &["title", "taskTitle"],
    hint: "title",
};

/// Parent key result; `title` belongs to the task here
const PARENT_KEY_RESULT: Keys = Keys {
    titles: &["keyResultTitle"],
    ..KEY_RESULT
};

/// Intents owned by [`KeyResultTaskHandler`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyResultTaskIntent {
    Create,
    Update,
    Delete,
    GetInfo,
    Search,
    ByKeyResult,
    GetAll,
}

impl IntentKind for KeyResultTaskIntent {
    const ALL: &'static [Self] = &[
        Self::Create,
        Self::Update,
        Self::Delete,
        Self::GetInfo,
        Self::Search,
        Self::ByKeyResult,
        Self::GetAll,
    ];

    fn name(self) -> &'static str {
        match self {
            Self::Create => "CreateKeyResultTask",
            Self::Update => "UpdateKeyResultTask",
            Self::Delete => "DeleteKeyResultTask",
            Self::GetInfo => "GetKeyResultTaskInfo",
            Self::Search => "SearchKeyResultTasks",
            Self::ByKeyResult => "GetKeyResultTasksByKeyResult",
            Self::GetAll => "GetAllKeyResultTasks",
        }
    }
}

/// Handles key result task intents
pub struct KeyResultTaskHandler {
    tasks: Arc<dyn KeyResultTaskService>,
    users: Arc<dyn UserService>,
    memory: ConversationMemory,
    intents: IntentSet,
}

impl KeyResultTaskHandler {
    /// Create handler
    #[must_use]
    pub fn new(
        tasks: Arc<dyn KeyResultTaskService>,
        users: Arc<dyn UserService>,
        memory: ConversationMemory,
    ) -> Self {
        Self {
            tasks,
            users,
            memory,
            intents: IntentSet::of::<KeyResultTaskIntent>(),
        }
    }

    /// Collaborator from `collaboratorId`, else `collaboratorName` via the user directory
    async fn collaborator(&self, turn: &Turn<'_>) -> Option<EntityId> {
        if let Some(id) = turn.params().get_id("collaboratorId") {
            return Some(id);
        }
        let name = turn.params().get_text("collaboratorName")?;
        let query = UserQuery {
            keyword: Some(name.to_string()),
            ..UserQuery::default()
        };
        let outcome = self.users.search_users(turn.user(), query).await;
        turn.pick_match(name, outcome)
    }

    async fn create(&self, turn: &Turn<'_>) -> ResultEnvelope {
        let Some(title) = turn.params().first_text(TASK.titles) else {
            return turn.missing(EntityType::KeyResultTask, Operation::Create, "title");
        };
        let draft = KeyResultTaskDraft {
            title: title.to_string(),
            description: turn.text("description"),
            key_result: turn.locate(&PARENT_KEY_RESULT).await,
            collaborator_id: self.collaborator(turn).await,
            priority: turn.params().get_enum::<Priority>("priority"),
            schedule: turn.schedule(),
        };
        let outcome = self.tasks.create_task(turn.user(), draft).await;
        turn.settle(Operation::Create, outcome).await
    }

    async fn update(&self, turn: &Turn<'_>) -> ResultEnvelope {
        // Locate the task before any user lookup.
        let Some(target) = turn.locate(&TASK).await else {
            return turn.which(&TASK, Operation::Update);
        };
        let changes = KeyResultTaskChanges {
            new_title: turn.text("newTitle"),
            description: turn.text("description"),
            collaborator_id: self.collaborator(turn).await,
            priority: turn.params().get_enum::<Priority>("priority"),
            schedule: turn.schedule(),
        };
        let outcome = self.tasks.update_task(turn.user(), target, changes).await;
        turn.settle(Operation::Update, outcome).await
    }

    async fn search(&self, turn: &Turn<'_>, key_result_required: bool) -> ResultEnvelope {
        let key_result = if key_result_required {
            match turn.locate(&PARENT_KEY_RESULT).await {
                Some(parent) => Some(parent),
                None => return turn.which(&PARENT_KEY_RESULT, Operation::Search),
            }
        } else {
            turn.explicit(&PARENT_KEY_RESULT)
        };
        let query = KeyResultTaskQuery {
            keyword: turn.keyword(),
            status: turn.schedule().status,
            priority: turn.params().get_enum::<Priority>("priority"),
            key_result,
        };
        let outcome = self.tasks.search_tasks(turn.user(), query).await;
        turn.settle_listing(outcome).await
    }
}

#[async_trait]
impl IntentHandler for KeyResultTaskHandler {
    fn name(&self) -> &'static str {
        "key_result_task"
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
        let Some(kind) = KeyResultTaskIntent::from_name(intent) else {
            return ResultEnvelope::unrouted(intent);
        };
        let turn = Turn::new(&self.memory, conversation, intent, params);
        let user = turn.user();

        match kind {
            KeyResultTaskIntent::Create => self.create(&turn).await,
            KeyResultTaskIntent::Update => self.update(&turn).await,
            KeyResultTaskIntent::Delete => {
                turn.on_target(&TASK, Operation::Delete, |target| self.tasks.delete_task(user, target))
                    .await
            }
            KeyResultTaskIntent::GetInfo => {
                turn.on_target(&TASK, Operation::View, |target| self.tasks.get_task(user, target))
                    .await
            }
            KeyResultTaskIntent::Search => self.search(&turn, false).await,
            KeyResultTaskIntent::ByKeyResult => self.search(&turn, true).await,
            KeyResultTaskIntent::GetAll => {
                let outcome = self.tasks.search_tasks(user, KeyResultTaskQuery::default()).await;
                turn.settle_listing(outcome).await
            }
        }
    }
}
