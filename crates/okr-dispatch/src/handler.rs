//! Intent handler seam
//!
//! A handler claims a fixed, closed set of intent names for one entity
//! family. The set is described by an [`IntentKind`] enum and frozen into an
//! [`IntentSet`] when the handler is constructed; `handle` parses the name
//! back into the enum and matches on it.

use crate::envelope::ResultEnvelope;
use crate::params::ParameterBag;
use crate::types::ConversationContext;
use async_trait::async_trait;
use std::collections::BTreeSet;

/// Closed enum of intents owned by one handler
pub trait IntentKind: Sized + Copy + 'static {
    /// Every intent of the family
    const ALL: &'static [Self];

    /// Exact, case-sensitive intent name
    fn name(self) -> &'static str;

    /// Parse an intent name
    fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|kind| kind.name() == name)
    }
}

/// Immutable set of intent names claimed by a handler
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IntentSet {
    names: BTreeSet<&'static str>,
}

impl IntentSet {
    /// Build the set for an intent enum
    #[must_use]
    pub fn of<K: IntentKind>() -> Self {
        Self {
            names: K::ALL.iter().map(|kind| kind.name()).collect(),
        }
    }

    /// Build from explicit names
    #[must_use]
    pub fn from_names(names: &[&'static str]) -> Self {
        Self {
            names: names.iter().copied().collect(),
        }
    }

    /// Exact membership test
    #[inline]
    #[must_use]
    pub fn contains(&self, intent: &str) -> bool {
        self.names.contains(intent)
    }

    /// Names in sorted order
    pub fn iter(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.names.iter().copied()
    }

    /// Number of intents
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether no intents are claimed
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Handler for one entity family
///
/// Implementations must not panic or return early without an envelope:
/// every collaborator failure is converted into a failure envelope here.
#[async_trait]
pub trait IntentHandler: Send + Sync {
    /// Handler name for logs and registry errors
    fn name(&self) -> &'static str;

    /// Intents this handler claims
    fn intents(&self) -> &IntentSet;

    /// Whether the intent is claimed
    fn can_handle(&self, intent: &str) -> bool {
        self.intents().contains(intent)
    }

    /// Execute a claimed intent
    async fn handle(
        &self,
        conversation: &ConversationContext,
        intent: &str,
        params: &ParameterBag,
    ) -> ResultEnvelope;
}
