//! OKR Dispatch - conversational intent dispatch for OKR tracking
//!
//! Sits between an intent classifier and the OKR domain services:
//! - Routes a classified intent to the one handler that claims it
//! - Resolves loosely-typed chat parameters into typed values
//! - Remembers the last entity of each type per conversation, so follow-up
//!   turns ("make it 40%") can omit identifiers
//! - Normalizes every outcome into a uniform [`ResultEnvelope`]
//!
//! # Example
//!
//! ```rust,ignore
//! use okr_dispatch::prelude::*;
//! use std::sync::Arc;
//!
//! # async fn example(backend: Arc<MyBackend>) -> Result<(), Box<dyn std::error::Error>> {
//! let memory = ConversationMemory::default();
//! let dispatcher = IntentDispatcher::standard(Services::from_backend(backend), memory)?;
//!
//! let user = UserContext::new("u1", "org1", Role::Manager);
//! let params = ParameterBag::new().with("title", "Grow revenue");
//! let envelope = dispatcher.route("conv-1", "CreateObjective", &params, &user).await;
//!
//! println!("{}", envelope.message);
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod collaborators;
pub mod config;
pub mod dispatcher;
pub mod envelope;
pub mod error;
pub mod handler;
pub mod handlers;
pub mod memory;
pub mod params;
pub mod types;

// Re-exports for convenience
pub use collaborators::{
    CollabResult, EntityDto, Invitation, KeyResultChanges, KeyResultDraft, KeyResultDto, KeyResultQuery,
    KeyResultService, KeyResultTaskChanges, KeyResultTaskDraft, KeyResultTaskDto, KeyResultTaskQuery,
    KeyResultTaskService, Listing, ObjectiveChanges, ObjectiveDraft, ObjectiveDto, ObjectiveQuery,
    ObjectiveService, OkrSessionChanges, OkrSessionDraft, OkrSessionDto, OkrSessionQuery, OkrSessionService,
    Priority, Schedule, Status, TeamChanges, TeamDraft, TeamDto, TeamQuery, TeamService, UserDto, UserQuery,
    UserService,
};
pub use config::{DispatchConfig, MemoryConfig};
pub use dispatcher::{DispatchStats, IntentDispatcher, Services};
pub use envelope::ResultEnvelope;
pub use error::{CollaboratorError, ConfigError, ErrorKind, RegistryError};
pub use handler::{IntentHandler, IntentKind, IntentSet};
pub use memory::ConversationMemory;
pub use params::{ParamEnum, ParameterBag};
pub use types::{
    ConversationContext, ConversationId, EntityId, EntityLocator, EntityType, Operation, Role, UserContext,
};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for wiring and calling the dispatcher
    pub use crate::{
        ConversationMemory, DispatchConfig, EntityType, ErrorKind, IntentDispatcher, Operation, ParameterBag,
        ResultEnvelope, Role, Services, UserContext,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
