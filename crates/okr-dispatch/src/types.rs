//! Core types for intent dispatch
//!
//! Defines the vocabulary shared by every handler:
//! - Conversation and user context supplied by the caller
//! - Entity families and the operations performed on them
//! - Opaque entity identifiers and locators handed to collaborators

use crate::params::ParamEnum;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Conversation identifier supplied by the chat transport
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationId(String);

impl ConversationId {
    /// Create conversation ID
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow as string slice
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ConversationId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ConversationId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Opaque entity identifier issued by a domain collaborator
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    /// Wrap an identifier
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh random identifier
    #[inline]
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Borrow as string slice
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<Uuid> for EntityId {
    fn from(value: Uuid) -> Self {
        Self(value.to_string())
    }
}

impl From<&str> for EntityId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for EntityId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Role of the calling user inside their organization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Role {
    /// Organization administrator
    Admin,
    /// Team manager
    Manager,
    /// Regular member
    #[default]
    Member,
    /// Read-only viewer
    Viewer,
}

impl Role {
    /// Stable name
    #[inline]
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Role::Admin => "Admin",
            Role::Manager => "Manager",
            Role::Member => "Member",
            Role::Viewer => "Viewer",
        }
    }
}

impl ParamEnum for Role {
    const VARIANTS: &'static [Self] = &[Role::Admin, Role::Manager, Role::Member, Role::Viewer];

    fn name(self) -> &'static str {
        Role::name(self)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Identity of the user behind a chat turn
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserContext {
    /// Calling user
    pub user_id: String,
    /// Tenant the user belongs to
    pub organization_id: String,
    /// Role within the tenant
    #[serde(default)]
    pub role: Role,
}

impl UserContext {
    /// Create user context
    #[inline]
    #[must_use]
    pub fn new(user_id: impl Into<String>, organization_id: impl Into<String>, role: Role) -> Self {
        Self {
            user_id: user_id.into(),
            organization_id: organization_id.into(),
            role,
        }
    }
}

/// Per-turn context handed to handlers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationContext {
    /// Conversation the turn belongs to
    pub conversation_id: ConversationId,
    /// Calling user
    pub user: UserContext,
}

impl ConversationContext {
    /// Create context
    #[inline]
    #[must_use]
    pub fn new(conversation_id: impl Into<ConversationId>, user: UserContext) -> Self {
        Self {
            conversation_id: conversation_id.into(),
            user,
        }
    }
}

/// Entity families known to the dispatch layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EntityType {
    /// OKR objective
    Objective,
    /// Measurable key result under an objective
    KeyResult,
    /// Task contributing to a key result
    KeyResultTask,
    /// Team
    Team,
    /// OKR planning session (quarter, cycle)
    OkrSession,
    /// Organization user
    User,
}

impl EntityType {
    /// All entity types
    pub const ALL: [EntityType; 6] = [
        EntityType::Objective,
        EntityType::KeyResult,
        EntityType::KeyResultTask,
        EntityType::Team,
        EntityType::OkrSession,
        EntityType::User,
    ];

    /// Stable type name, as stored in memory and envelopes
    #[inline]
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            EntityType::Objective => "Objective",
            EntityType::KeyResult => "KeyResult",
            EntityType::KeyResultTask => "KeyResultTask",
            EntityType::Team => "Team",
            EntityType::OkrSession => "OkrSession",
            EntityType::User => "User",
        }
    }

    /// Human-readable label used in chat replies
    #[inline]
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            EntityType::Objective => "objective",
            EntityType::KeyResult => "key result",
            EntityType::KeyResultTask => "key result task",
            EntityType::Team => "team",
            EntityType::OkrSession => "OKR session",
            EntityType::User => "user",
        }
    }

    /// Look up by stable name
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.name() == name)
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Operation reported in a result envelope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operation {
    /// Entity created
    Create,
    /// Entity changed
    Update,
    /// Entity removed
    Delete,
    /// Entity details read
    View,
    /// Listing or search
    Search,
    /// User invited
    Invite,
}

impl Operation {
    /// Stable name
    #[inline]
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Operation::Create => "Create",
            Operation::Update => "Update",
            Operation::Delete => "Delete",
            Operation::View => "View",
            Operation::Search => "Search",
            Operation::Invite => "Invite",
        }
    }

    /// Verb used in failure replies ("Sorry, I couldn't create the ...")
    #[inline]
    #[must_use]
    pub fn verb(self) -> &'static str {
        match self {
            Operation::Create => "create",
            Operation::Update => "update",
            Operation::Delete => "delete",
            Operation::View => "look up",
            Operation::Search => "search for",
            Operation::Invite => "invite",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How a collaborator should find an existing entity
///
/// At least one of `id` / `title` is present; the collaborator performs
/// any title to id lookup itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityLocator {
    /// Exact identifier
    pub id: Option<EntityId>,
    /// Human-readable discriminator (title, name or email)
    pub title: Option<String>,
}

impl EntityLocator {
    /// Locate by identifier
    #[inline]
    #[must_use]
    pub fn by_id(id: impl Into<EntityId>) -> Self {
        Self {
            id: Some(id.into()),
            title: None,
        }
    }

    /// Locate by title
    #[inline]
    #[must_use]
    pub fn by_title(title: impl Into<String>) -> Self {
        Self {
            id: None,
            title: Some(title.into()),
        }
    }

    /// Build from optional parts, `None` when both are missing
    #[must_use]
    pub fn from_parts(id: Option<EntityId>, title: Option<&str>) -> Option<Self> {
        let title = title.map(str::to_string);
        if id.is_none() && title.is_none() {
            return None;
        }
        Some(Self { id, title })
    }
}

impl fmt::Display for EntityLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.id, &self.title) {
            (Some(id), _) => write!(f, "{id}"),
            (None, Some(title)) => write!(f, "'{title}'"),
            (None, None) => f.write_str("<unspecified>"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_type_names_round_trip() {
        for ty in EntityType::ALL {
            assert_eq!(EntityType::from_name(ty.name()), Some(ty));
        }
        assert_eq!(EntityType::from_name("keyresult"), None);
    }

    #[test]
    fn entity_type_serializes_as_name() {
        let json = serde_json::to_string(&EntityType::KeyResultTask).unwrap();
        assert_eq!(json, "\"KeyResultTask\"");
    }

    #[test]
    fn locator_requires_one_part() {
        assert!(EntityLocator::from_parts(None, None).is_none());

        let loc = EntityLocator::from_parts(None, Some("Ship v1")).unwrap();
        assert_eq!(loc.title.as_deref(), Some("Ship v1"));
        assert_eq!(loc.to_string(), "'Ship v1'");
    }

    #[test]
    fn entity_id_from_uuid() {
        let uuid = Uuid::nil();
        let id = EntityId::from(uuid);
        assert_eq!(id.as_str(), "00000000-0000-0000-0000-000000000000");
    }

    #[test]
    fn user_context_role_defaults_to_member() {
        let ctx: UserContext =
            serde_json::from_str(r#"{"userId":"u1","organizationId":"o1"}"#).unwrap();
        assert_eq!(ctx.role, Role::Member);
    }
}
