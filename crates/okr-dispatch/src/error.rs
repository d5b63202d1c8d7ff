//! Error types for intent dispatch
//!
//! Provides error handling for:
//! - Domain collaborator failures (not found, validation, backend)
//! - Handler registry validation at startup
//! - Configuration loading
//!
//! Collaborator errors never cross the dispatcher boundary; handlers fold
//! them into a failure envelope tagged with an [`ErrorKind`].

use crate::types::{EntityLocator, EntityType};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Failure classification carried on every failed envelope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorKind {
    /// Identifying information missing and not recallable
    Guidance,
    /// Collaborator could not find the entity
    NotFound,
    /// Collaborator rejected the request
    Validation,
    /// Any other failure (backend, panic)
    Unexpected,
    /// No handler claims the intent
    Unrouted,
}

impl ErrorKind {
    /// Stable name
    #[inline]
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            ErrorKind::Guidance => "guidance",
            ErrorKind::NotFound => "notFound",
            ErrorKind::Validation => "validation",
            ErrorKind::Unexpected => "unexpected",
            ErrorKind::Unrouted => "unrouted",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Errors returned by domain collaborators
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CollaboratorError {
    /// Referenced entity does not exist (or is not visible to the caller)
    #[error("I couldn't find a {} matching {locator}.", .entity.label())]
    NotFound {
        /// Entity family
        entity: EntityType,
        /// What was looked up
        locator: EntityLocator,
    },

    /// Title matched more than one entity
    #[error("More than one {} is called '{title}'. Please use its ID instead.", .entity.label())]
    Ambiguous {
        /// Entity family
        entity: EntityType,
        /// Title that matched several entities
        title: String,
    },

    /// Business rule or input validation failed
    #[error("{0}")]
    Validation(String),

    /// Caller is not allowed to perform the operation
    #[error("{0}")]
    Forbidden(String),

    /// Storage or infrastructure failure
    #[error("{0}")]
    Backend(String),
}

impl CollaboratorError {
    /// Create not-found error
    #[inline]
    #[must_use]
    pub fn not_found(entity: EntityType, locator: EntityLocator) -> Self {
        Self::NotFound { entity, locator }
    }

    /// Create validation error
    #[inline]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create backend error
    #[inline]
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend(message.into())
    }

    /// Envelope classification for this error
    #[inline]
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Ambiguous { .. } | Self::Validation(_) | Self::Forbidden(_) => {
                ErrorKind::Validation
            }
            Self::Backend(_) => ErrorKind::Unexpected,
        }
    }

    /// Check if the error is meaningful to the end user as-is
    #[inline]
    #[must_use]
    pub fn is_domain(&self) -> bool {
        !matches!(self, Self::Backend(_))
    }
}

/// Handler registry errors, raised while wiring the dispatcher
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// Two handlers claim the same intent name
    #[error("intent '{intent}' is claimed by both '{registered}' and '{incoming}'")]
    OverlappingIntent {
        /// Contested intent name
        intent: String,
        /// Handler that registered first
        registered: String,
        /// Handler being registered
        incoming: String,
    },

    /// Handler claims no intents at all
    #[error("handler '{0}' claims no intents")]
    EmptyHandler(String),
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("failed to read config {path}: {source}")]
    Io {
        /// Path that failed
        path: String,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML for the schema
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Values are out of range
    #[error("invalid config value: {0}")]
    Invalid(String),
}
