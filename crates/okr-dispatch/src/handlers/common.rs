//! Resolution steps shared by every handler
//!
//! Identifier resolution is uniform across entity families:
//! explicit id and/or title, else conversation memory, else a guidance
//! failure. Outcomes are settled here too, so memory is updated and
//! failures are classified and logged in exactly one place.

use crate::collaborators::{CollabResult, EntityDto, Listing, Schedule, Status};
use crate::envelope::ResultEnvelope;
use crate::error::{CollaboratorError, ErrorKind};
use crate::memory::ConversationMemory;
use crate::params::ParameterBag;
use crate::types::{ConversationContext, EntityId, EntityLocator, EntityType, Operation, UserContext};
use std::future::Future;

/// Parameter keys that identify an entity of one family
#[derive(Debug, Clone, Copy)]
pub(crate) struct Keys {
    pub(crate) entity: EntityType,
    pub(crate) id: &'static str,
    pub(crate) titles: &'static [&'static str],
    /// What to call the title in guidance ("title", "name", "email")
    pub(crate) hint: &'static str,
}

/// One chat turn as seen by a handler
pub(crate) struct Turn<'a> {
    memory: &'a ConversationMemory,
    conversation: &'a ConversationContext,
    intent: &'a str,
    params: &'a ParameterBag,
}

impl<'a> Turn<'a> {
    pub(crate) fn new(
        memory: &'a ConversationMemory,
        conversation: &'a ConversationContext,
        intent: &'a str,
        params: &'a ParameterBag,
    ) -> Self {
        Self {
            memory,
            conversation,
            intent,
            params,
        }
    }

    pub(crate) fn user(&self) -> &'a UserContext {
        &self.conversation.user
    }

    pub(crate) fn params(&self) -> &'a ParameterBag {
        self.params
    }

    pub(crate) fn text(&self, key: &str) -> Option<String> {
        self.params.get_text(key).map(str::to_string)
    }

    pub(crate) fn keyword(&self) -> Option<String> {
        self.params.first_text(&["query", "keyword"]).map(str::to_string)
    }

    pub(crate) fn schedule(&self) -> Schedule {
        Schedule {
            start_date: self.params.get_date("startDate"),
            end_date: self.params.get_date("endDate"),
            status: self.params.get_enum::<Status>("status"),
            progress: self.params.get_f64("progress"),
        }
    }

    /// Locator from explicit parameters only
    pub(crate) fn explicit(&self, keys: &Keys) -> Option<EntityLocator> {
        EntityLocator::from_parts(self.params.get_id(keys.id), self.params.first_text(keys.titles))
    }

    /// Locator from explicit parameters, falling back to conversation memory
    pub(crate) async fn locate(&self, keys: &Keys) -> Option<EntityLocator> {
        if let Some(locator) = self.explicit(keys) {
            return Some(locator);
        }
        let recalled = self
            .memory
            .recall(&self.conversation.conversation_id, keys.entity)
            .await?;
        tracing::debug!(
            conversation_id = %self.conversation.conversation_id,
            intent = self.intent,
            entity_type = %keys.entity,
            entity_id = %recalled,
            "filled identifier from conversation memory"
        );
        Some(EntityLocator::by_id(recalled))
    }

    /// Resolve the target entity and run `call` on it, or ask for guidance
    pub(crate) async fn on_target<T, F, Fut>(&self, keys: &Keys, operation: Operation, call: F) -> ResultEnvelope
    where
        T: EntityDto,
        F: FnOnce(EntityLocator) -> Fut,
        Fut: Future<Output = CollabResult<T>>,
    {
        match self.locate(keys).await {
            Some(target) => self.settle(operation, call(target).await).await,
            None => self.which(keys, operation),
        }
    }

    /// Guidance failure: the user must say which entity they mean
    pub(crate) fn which(&self, keys: &Keys, operation: Operation) -> ResultEnvelope {
        let label = keys.entity.label();
        self.guidance(
            keys.entity,
            operation,
            format!(
                "Please provide {} {label} ID or {}, or tell me which {label} you mean.",
                article(label),
                keys.hint
            ),
        )
    }

    /// Guidance failure: a required value is missing
    pub(crate) fn missing(&self, entity: EntityType, operation: Operation, field: &str) -> ResultEnvelope {
        self.guidance(
            entity,
            operation,
            format!("Please provide {} {field} for the {}.", article(field), entity.label()),
        )
    }

    fn guidance(&self, entity: EntityType, operation: Operation, message: String) -> ResultEnvelope {
        tracing::debug!(
            conversation_id = %self.conversation.conversation_id,
            intent = self.intent,
            entity_type = %entity,
            "asking user for guidance"
        );
        ResultEnvelope::guidance(message).about(entity, operation)
    }

    /// Fold a single-entity outcome into an envelope, remembering the entity
    pub(crate) async fn settle<T: EntityDto>(&self, operation: Operation, outcome: CollabResult<T>) -> ResultEnvelope {
        match outcome {
            Ok(dto) => {
                let entity_id = dto.entity_id().clone();
                self.remember(T::ENTITY_TYPE, &entity_id).await;
                tracing::info!(
                    conversation_id = %self.conversation.conversation_id,
                    intent = self.intent,
                    entity_type = %T::ENTITY_TYPE,
                    entity_id = %entity_id,
                    operation = %operation,
                    "intent completed"
                );
                let message = reply(dto.prompt_template(), || {
                    default_reply(T::ENTITY_TYPE, operation, dto.title())
                });
                ResultEnvelope::ok(&dto, T::ENTITY_TYPE, Some(entity_id), operation, message)
            }
            Err(err) => self.failure(T::ENTITY_TYPE, operation, &err),
        }
    }

    /// Fold a listing outcome; a single hit identifies an entity and is remembered
    pub(crate) async fn settle_listing<T: EntityDto>(&self, outcome: CollabResult<Listing<T>>) -> ResultEnvelope {
        match outcome {
            Ok(listing) => {
                let entity_id = match listing.items.as_slice() {
                    [only] => {
                        let id = only.entity_id().clone();
                        self.remember(T::ENTITY_TYPE, &id).await;
                        Some(id)
                    }
                    _ => None,
                };
                tracing::info!(
                    conversation_id = %self.conversation.conversation_id,
                    intent = self.intent,
                    entity_type = %T::ENTITY_TYPE,
                    hits = listing.items.len(),
                    "search completed"
                );
                let message = reply(&listing.prompt_template, || {
                    let count = listing.items.len();
                    let plural = if count == 1 { "" } else { "s" };
                    format!("Found {count} {}{plural}.", T::ENTITY_TYPE.label())
                });
                ResultEnvelope::ok(&listing, T::ENTITY_TYPE, entity_id, Operation::Search, message)
            }
            Err(err) => self.failure(T::ENTITY_TYPE, Operation::Search, &err),
        }
    }

    /// Resolve a name to a single id through a lookup collaborator
    ///
    /// An exact (case-insensitive) title match wins; otherwise a lone hit is
    /// accepted. Anything else, including a failed lookup, resolves to `None`.
    pub(crate) fn pick_match<T: EntityDto>(&self, name: &str, outcome: CollabResult<Listing<T>>) -> Option<EntityId> {
        let listing = match outcome {
            Ok(listing) => listing,
            Err(err) => {
                tracing::warn!(
                    conversation_id = %self.conversation.conversation_id,
                    intent = self.intent,
                    entity_type = %T::ENTITY_TYPE,
                    error = %err,
                    "lookup failed, continuing without it"
                );
                return None;
            }
        };
        let mut exact = listing
            .items
            .iter()
            .filter(|item| item.title().eq_ignore_ascii_case(name));
        let picked = match (exact.next(), exact.next()) {
            (Some(hit), None) => Some(hit),
            (Some(_), Some(_)) => None,
            (None, _) => match listing.items.as_slice() {
                [only] => Some(only),
                _ => None,
            },
        };
        let picked = picked.map(|item| item.entity_id().clone());
        tracing::debug!(
            intent = self.intent,
            entity_type = %T::ENTITY_TYPE,
            lookup = name,
            resolved = picked.is_some(),
            "resolved name through lookup"
        );
        picked
    }

    async fn remember(&self, entity: EntityType, entity_id: &EntityId) {
        self.memory
            .remember(&self.conversation.conversation_id, entity, entity_id.clone())
            .await;
    }

    fn failure(&self, entity: EntityType, operation: Operation, err: &CollaboratorError) -> ResultEnvelope {
        let kind = err.kind();
        let message = if kind == ErrorKind::Unexpected {
            tracing::error!(
                conversation_id = %self.conversation.conversation_id,
                user_id = %self.conversation.user.user_id,
                organization_id = %self.conversation.user.organization_id,
                intent = self.intent,
                entity_type = %entity,
                operation = %operation,
                error = %err,
                "collaborator failed unexpectedly"
            );
            format!("Sorry, I couldn't {} the {}: {err}", operation.verb(), entity.label())
        } else {
            tracing::info!(
                conversation_id = %self.conversation.conversation_id,
                intent = self.intent,
                entity_type = %entity,
                kind = %kind,
                error = %err,
                "collaborator rejected request"
            );
            err.to_string()
        };
        ResultEnvelope::fail(kind, message).about(entity, operation)
    }
}

fn reply(template: &str, fallback: impl FnOnce() -> String) -> String {
    if template.trim().is_empty() {
        fallback()
    } else {
        template.to_string()
    }
}

fn default_reply(entity: EntityType, operation: Operation, title: &str) -> String {
    let label = entity.label();
    match operation {
        Operation::Create => format!("Created {label} '{title}'."),
        Operation::Update => format!("Updated {label} '{title}'."),
        Operation::Delete => format!("Deleted {label} '{title}'."),
        Operation::View => format!("Here are the details of {label} '{title}'."),
        Operation::Search => format!("Found {label} '{title}'."),
        Operation::Invite => format!("Invited '{title}'."),
    }
}

fn article(word: &str) -> &'static str {
    match word.chars().next().map(|c| c.to_ascii_lowercase()) {
        Some('a' | 'e' | 'i' | 'o' | 'u') => "an",
        _ => "a",
    }
}
