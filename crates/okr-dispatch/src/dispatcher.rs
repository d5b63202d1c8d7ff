//! Handler registry and intent dispatcher
//!
//! Provides [`IntentDispatcher`], the single entry point of the layer. Handlers
//! are registered once at startup; registration rejects any handler whose
//! intent set overlaps one already registered, so at most one handler can
//! claim a given intent name.
//!
//! `route` never fails: unclaimed intents, collaborator errors and even
//! panicking handlers all come back as a [`ResultEnvelope`].

use crate::collaborators::{
    KeyResultService, KeyResultTaskService, ObjectiveService, OkrSessionService, TeamService, UserService,
};
use crate::envelope::ResultEnvelope;
use crate::error::{ErrorKind, RegistryError};
use crate::handler::IntentHandler;
use crate::handlers::{
    KeyResultHandler, KeyResultTaskHandler, ObjectiveHandler, OkrSessionHandler, TeamHandler, UserHandler,
};
use crate::memory::ConversationMemory;
use crate::params::ParameterBag;
use crate::types::{ConversationContext, UserContext};
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Collaborators needed by the standard handler set
#[derive(Clone)]
pub struct Services {
    pub objectives: Arc<dyn ObjectiveService>,
    pub key_results: Arc<dyn KeyResultService>,
    pub tasks: Arc<dyn KeyResultTaskService>,
    pub teams: Arc<dyn TeamService>,
    pub sessions: Arc<dyn OkrSessionService>,
    pub users: Arc<dyn UserService>,
}

impl Services {
    /// Use one backend for every collaborator
    #[must_use]
    pub fn from_backend<B>(backend: Arc<B>) -> Self
    where
        B: ObjectiveService
            + KeyResultService
            + KeyResultTaskService
            + TeamService
            + OkrSessionService
            + UserService
            + 'static,
    {
        Self {
            objectives: backend.clone(),
            key_results: backend.clone(),
            tasks: backend.clone(),
            teams: backend.clone(),
            sessions: backend.clone(),
            users: backend,
        }
    }
}

/// Dispatch counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchStats {
    /// Turns handed to a handler
    pub routed: u64,
    /// Successful envelopes
    pub succeeded: u64,
    /// Failure envelopes returned by handlers
    pub failed: u64,
    /// Turns no handler claimed
    pub unrouted: u64,
    /// Handlers that panicked
    pub panicked: u64,
}

#[derive(Debug, Default)]
struct Counters {
    routed: AtomicU64,
    succeeded: AtomicU64,
    failed: AtomicU64,
    unrouted: AtomicU64,
    panicked: AtomicU64,
}

impl Counters {
    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self) -> DispatchStats {
        DispatchStats {
            routed: self.routed.load(Ordering::Relaxed),
            succeeded: self.succeeded.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            unrouted: self.unrouted.load(Ordering::Relaxed),
            panicked: self.panicked.load(Ordering::Relaxed),
        }
    }
}

/// Routes intents to the handler that claims them
#[derive(Default)]
pub struct IntentDispatcher {
    handlers: Vec<Arc<dyn IntentHandler>>,
    counters: Counters,
}

impl IntentDispatcher {
    /// Create empty dispatcher
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a list of handlers
    ///
    /// # Errors
    /// Same as [`IntentDispatcher::register`].
    pub fn from_handlers<I>(handlers: I) -> Result<Self, RegistryError>
    where
        I: IntoIterator<Item = Arc<dyn IntentHandler>>,
    {
        let mut dispatcher = Self::new();
        for handler in handlers {
            dispatcher.register(handler)?;
        }
        Ok(dispatcher)
    }

    /// Wire the six standard handlers around one shared memory
    ///
    /// # Errors
    /// Only if the built-in intent sets overlap, which would be a bug.
    pub fn standard(services: Services, memory: ConversationMemory) -> Result<Self, RegistryError> {
        let handlers: Vec<Arc<dyn IntentHandler>> = vec![
            Arc::new(ObjectiveHandler::new(services.objectives, memory.clone())),
            Arc::new(KeyResultHandler::new(services.key_results, memory.clone())),
            Arc::new(KeyResultTaskHandler::new(
                services.tasks,
                services.users.clone(),
                memory.clone(),
            )),
            Arc::new(TeamHandler::new(services.teams.clone(), memory.clone())),
            Arc::new(OkrSessionHandler::new(services.sessions, memory.clone())),
            Arc::new(UserHandler::new(services.users, services.teams, memory)),
        ];
        Self::from_handlers(handlers)
    }

    /// Register a handler
    ///
    /// # Errors
    /// - `RegistryError::EmptyHandler` if the handler claims nothing
    /// - `RegistryError::OverlappingIntent` if an intent is already claimed
    pub fn register(&mut self, handler: Arc<dyn IntentHandler>) -> Result<&mut Self, RegistryError> {
        if handler.intents().is_empty() {
            return Err(RegistryError::EmptyHandler(handler.name().to_string()));
        }
        for intent in handler.intents().iter() {
            if let Some(owner) = self.find(intent) {
                return Err(RegistryError::OverlappingIntent {
                    intent: intent.to_string(),
                    registered: owner.name().to_string(),
                    incoming: handler.name().to_string(),
                });
            }
        }
        tracing::debug!(
            handler = handler.name(),
            intents = handler.intents().len(),
            "registered intent handler"
        );
        self.handlers.push(handler);
        Ok(self)
    }

    fn find(&self, intent: &str) -> Option<&Arc<dyn IntentHandler>> {
        self.handlers.iter().find(|handler| handler.can_handle(intent))
    }

    /// Route one chat turn
    pub async fn route(
        &self,
        conversation_id: &str,
        intent: &str,
        params: &ParameterBag,
        user: &UserContext,
    ) -> ResultEnvelope {
        let Some(handler) = self.find(intent) else {
            Counters::bump(&self.counters.unrouted);
            tracing::warn!(conversation_id, intent, "no handler claims intent");
            return ResultEnvelope::unrouted(intent);
        };
        Counters::bump(&self.counters.routed);

        let conversation = ConversationContext::new(conversation_id, user.clone());
        let outcome = AssertUnwindSafe(handler.handle(&conversation, intent, params))
            .catch_unwind()
            .await;

        match outcome {
            Ok(envelope) => {
                if envelope.success {
                    Counters::bump(&self.counters.succeeded);
                } else {
                    Counters::bump(&self.counters.failed);
                }
                envelope
            }
            Err(panic) => {
                Counters::bump(&self.counters.panicked);
                let reason = panic_message(panic.as_ref());
                tracing::error!(
                    conversation_id,
                    user_id = %user.user_id,
                    organization_id = %user.organization_id,
                    intent,
                    handler = handler.name(),
                    reason = %reason,
                    "intent handler panicked"
                );
                ResultEnvelope::fail(
                    ErrorKind::Unexpected,
                    format!("Sorry, I couldn't complete '{intent}': {reason}"),
                )
            }
        }
    }

    /// Claimed intents as `(intent, handler)` pairs, sorted by intent
    #[must_use]
    pub fn intents(&self) -> Vec<(&'static str, &'static str)> {
        let mut pairs: Vec<_> = self
            .handlers
            .iter()
            .flat_map(|handler| handler.intents().iter().map(move |intent| (intent, handler.name())))
            .collect();
        pairs.sort_unstable();
        pairs
    }

    /// Number of registered handlers
    #[inline]
    #[must_use]
    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    /// Snapshot of dispatch counters
    #[must_use]
    pub fn stats(&self) -> DispatchStats {
        self.counters.snapshot()
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(text) = panic.downcast_ref::<&str>() {
        (*text).to_string()
    } else if let Some(text) = panic.downcast_ref::<String>() {
        text.clone()
    } else {
        "unexpected internal error".to_string()
    }
}
