//! Domain collaborator boundary
//!
//! Traits implemented by the services that actually create, change and query
//! OKR entities, plus the request and DTO types exchanged with them. The
//! dispatch layer treats DTOs as opaque apart from their identifier and the
//! pre-rendered `prompt_template` sentence.

use crate::error::CollaboratorError;
use crate::params::ParamEnum;
use crate::types::{EntityId, EntityLocator, EntityType, Role, UserContext};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Result type returned by collaborators
pub type CollabResult<T> = Result<T, CollaboratorError>;

/// DTO returned for a single entity
pub trait EntityDto: Serialize + Send + Sync {
    /// Entity family of this DTO
    const ENTITY_TYPE: EntityType;

    /// Identifier of the entity
    fn entity_id(&self) -> &EntityId;

    /// Human-readable discriminator (title, name or email)
    fn title(&self) -> &str;

    /// Pre-rendered natural-language sentence
    fn prompt_template(&self) -> &str;
}

/// DTO returned by searches and listings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing<T> {
    /// Matching entities
    pub items: Vec<T>,
    /// Pre-rendered natural-language sentence
    pub prompt_template: String,
}

impl<T> Listing<T> {
    /// Create listing
    #[inline]
    #[must_use]
    pub fn new(items: Vec<T>, prompt_template: impl Into<String>) -> Self {
        Self {
            items,
            prompt_template: prompt_template.into(),
        }
    }
}

/// Progress status shared by objectives, key results, tasks and sessions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Status {
    /// Not started yet
    #[default]
    NotStarted,
    /// Work ongoing
    InProgress,
    /// Behind plan
    AtRisk,
    /// Done
    Completed,
    /// Abandoned
    Cancelled,
}

impl ParamEnum for Status {
    const VARIANTS: &'static [Self] = &[
        Status::NotStarted,
        Status::InProgress,
        Status::AtRisk,
        Status::Completed,
        Status::Cancelled,
    ];

    fn name(self) -> &'static str {
        match self {
            Status::NotStarted => "NotStarted",
            Status::InProgress => "InProgress",
            Status::AtRisk => "AtRisk",
            Status::Completed => "Completed",
            Status::Cancelled => "Cancelled",
        }
    }
}

/// Task priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub enum Priority {
    /// Low
    Low,
    /// Medium
    #[default]
    Medium,
    /// High
    High,
    /// Urgent
    Urgent,
}

impl ParamEnum for Priority {
    const VARIANTS: &'static [Self] = &[Priority::Low, Priority::Medium, Priority::High, Priority::Urgent];

    fn name(self) -> &'static str {
        match self {
            Priority::Low => "Low",
            Priority::Medium => "Medium",
            Priority::High => "High",
            Priority::Urgent => "Urgent",
        }
    }
}

/// Time-boxing and progress fields shared by change requests
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
    /// Start date
    pub start_date: Option<DateTime<Utc>>,
    /// End date
    pub end_date: Option<DateTime<Utc>>,
    /// Status
    pub status: Option<Status>,
    /// Progress percentage
    pub progress: Option<f64>,
}

// ---------------------------------------------------------------------------
// Objective
// ---------------------------------------------------------------------------

/// Objective DTO
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectiveDto {
    pub objective_id: EntityId,
    pub title: String,
    pub description: Option<String>,
    pub okr_session_id: Option<EntityId>,
    pub status: Status,
    pub progress: f64,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub prompt_template: String,
}

impl EntityDto for ObjectiveDto {
    const ENTITY_TYPE: EntityType = EntityType::Objective;

    fn entity_id(&self) -> &EntityId {
        &self.objective_id
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn prompt_template(&self) -> &str {
        &self.prompt_template
    }
}

/// New objective
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectiveDraft {
    pub title: String,
    pub description: Option<String>,
    pub okr_session: Option<EntityLocator>,
    pub schedule: Schedule,
}

/// Changes to an objective
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectiveChanges {
    pub new_title: Option<String>,
    pub description: Option<String>,
    pub schedule: Schedule,
}

/// Objective search filters; all empty lists everything
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectiveQuery {
    pub keyword: Option<String>,
    pub status: Option<Status>,
    pub okr_session: Option<EntityLocator>,
}

/// Objective service
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ObjectiveService: Send + Sync {
    async fn create_objective(&self, user: &UserContext, draft: ObjectiveDraft) -> CollabResult<ObjectiveDto>;
    async fn update_objective(
        &self,
        user: &UserContext,
        target: EntityLocator,
        changes: ObjectiveChanges,
    ) -> CollabResult<ObjectiveDto>;
    async fn delete_objective(&self, user: &UserContext, target: EntityLocator) -> CollabResult<ObjectiveDto>;
    async fn get_objective(&self, user: &UserContext, target: EntityLocator) -> CollabResult<ObjectiveDto>;
    async fn search_objectives(
        &self,
        user: &UserContext,
        query: ObjectiveQuery,
    ) -> CollabResult<Listing<ObjectiveDto>>;
}

// ---------------------------------------------------------------------------
// Key result
// ---------------------------------------------------------------------------

/// Key result DTO
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyResultDto {
    pub key_result_id: EntityId,
    pub title: String,
    pub description: Option<String>,
    pub objective_id: EntityId,
    pub status: Status,
    pub progress: f64,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub prompt_template: String,
}

impl EntityDto for KeyResultDto {
    const ENTITY_TYPE: EntityType = EntityType::KeyResult;

    fn entity_id(&self) -> &EntityId {
        &self.key_result_id
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn prompt_template(&self) -> &str {
        &self.prompt_template
    }
}

/// New key result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyResultDraft {
    pub title: String,
    pub description: Option<String>,
    pub objective: Option<EntityLocator>,
    pub schedule: Schedule,
}

/// Changes to a key result
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyResultChanges {
    pub new_title: Option<String>,
    pub description: Option<String>,
    pub schedule: Schedule,
}

/// Key result search filters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyResultQuery {
    pub keyword: Option<String>,
    pub status: Option<Status>,
    pub objective: Option<EntityLocator>,
}

/// Key result service
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait KeyResultService: Send + Sync {
    async fn create_key_result(&self, user: &UserContext, draft: KeyResultDraft) -> CollabResult<KeyResultDto>;
    async fn update_key_result(
        &self,
        user: &UserContext,
        target: EntityLocator,
        changes: KeyResultChanges,
    ) -> CollabResult<KeyResultDto>;
    async fn delete_key_result(&self, user: &UserContext, target: EntityLocator) -> CollabResult<KeyResultDto>;
    async fn get_key_result(&self, user: &UserContext, target: EntityLocator) -> CollabResult<KeyResultDto>;
    async fn search_key_results(
        &self,
        user: &UserContext,
        query: KeyResultQuery,
    ) -> CollabResult<Listing<KeyResultDto>>;
}

// ---------------------------------------------------------------------------
// Key result task
// ---------------------------------------------------------------------------

/// Key result task DTO
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyResultTaskDto {
    pub key_result_task_id: EntityId,
    pub title: String,
    pub description: Option<String>,
    pub key_result_id: EntityId,
    pub collaborator_id: Option<EntityId>,
    pub priority: Priority,
    pub status: Status,
    pub progress: f64,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub prompt_template: String,
}

impl EntityDto for KeyResultTaskDto {
    const ENTITY_TYPE: EntityType = EntityType::KeyResultTask;

    fn entity_id(&self) -> &EntityId {
        &self.key_result_task_id
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn prompt_template(&self) -> &str {
        &self.prompt_template
    }
}

/// New key result task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyResultTaskDraft {
    pub title: String,
    pub description: Option<String>,
    pub key_result: Option<EntityLocator>,
    pub collaborator_id: Option<EntityId>,
    pub priority: Option<Priority>,
    pub schedule: Schedule,
}

/// Changes to a key result task
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyResultTaskChanges {
    pub new_title: Option<String>,
    pub description: Option<String>,
    pub collaborator_id: Option<EntityId>,
    pub priority: Option<Priority>,
    pub schedule: Schedule,
}

/// Key result task search filters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyResultTaskQuery {
    pub keyword: Option<String>,
    pub status: Option<Status>,
    pub priority: Option<Priority>,
    pub key_result: Option<EntityLocator>,
}

/// Key result task service
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait KeyResultTaskService: Send + Sync {
    async fn create_task(&self, user: &UserContext, draft: KeyResultTaskDraft) -> CollabResult<KeyResultTaskDto>;
    async fn update_task(
        &self,
        user: &UserContext,
        target: EntityLocator,
        changes: KeyResultTaskChanges,
    ) -> CollabResult<KeyResultTaskDto>;
    async fn delete_task(&self, user: &UserContext, target: EntityLocator) -> CollabResult<KeyResultTaskDto>;
    async fn get_task(&self, user: &UserContext, target: EntityLocator) -> CollabResult<KeyResultTaskDto>;
    async fn search_tasks(
        &self,
        user: &UserContext,
        query: KeyResultTaskQuery,
    ) -> CollabResult<Listing<KeyResultTaskDto>>;
}

// ---------------------------------------------------------------------------
// Team
// ---------------------------------------------------------------------------

/// Team DTO
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamDto {
    pub team_id: EntityId,
    pub name: String,
    pub description: Option<String>,
    pub color: Option<String>,
    pub member_ids: Vec<EntityId>,
    pub prompt_template: String,
}

impl EntityDto for TeamDto {
    const ENTITY_TYPE: EntityType = EntityType::Team;

    fn entity_id(&self) -> &EntityId {
        &self.team_id
    }

    fn title(&self) -> &str {
        &self.name
    }

    fn prompt_template(&self) -> &str {
        &self.prompt_template
    }
}

/// New team
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamDraft {
    pub name: String,
    pub description: Option<String>,
    pub color: Option<String>,
}

/// Changes to a team
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamChanges {
    pub new_name: Option<String>,
    pub description: Option<String>,
    pub color: Option<String>,
}

/// Team search filters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamQuery {
    pub keyword: Option<String>,
}

/// Team service
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TeamService: Send + Sync {
    async fn create_team(&self, user: &UserContext, draft: TeamDraft) -> CollabResult<TeamDto>;
    async fn update_team(&self, user: &UserContext, target: EntityLocator, changes: TeamChanges) -> CollabResult<TeamDto>;
    async fn delete_team(&self, user: &UserContext, target: EntityLocator) -> CollabResult<TeamDto>;
    async fn get_team(&self, user: &UserContext, target: EntityLocator) -> CollabResult<TeamDto>;
    async fn search_teams(&self, user: &UserContext, query: TeamQuery) -> CollabResult<Listing<TeamDto>>;
    async fn add_member(&self, user: &UserContext, team: EntityLocator, member: EntityLocator) -> CollabResult<TeamDto>;
    async fn remove_member(
        &self,
        user: &UserContext,
        team: EntityLocator,
        member: EntityLocator,
    ) -> CollabResult<TeamDto>;
}

// ---------------------------------------------------------------------------
// OKR session
// ---------------------------------------------------------------------------

/// OKR session DTO
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OkrSessionDto {
    pub okr_session_id: EntityId,
    pub title: String,
    pub description: Option<String>,
    pub team_id: Option<EntityId>,
    pub status: Status,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub prompt_template: String,
}

impl EntityDto for OkrSessionDto {
    const ENTITY_TYPE: EntityType = EntityType::OkrSession;

    fn entity_id(&self) -> &EntityId {
        &self.okr_session_id
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn prompt_template(&self) -> &str {
        &self.prompt_template
    }
}

/// New OKR session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OkrSessionDraft {
    pub title: String,
    pub description: Option<String>,
    pub team: Option<EntityLocator>,
    pub schedule: Schedule,
}

/// Changes to an OKR session
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OkrSessionChanges {
    pub new_title: Option<String>,
    pub description: Option<String>,
    pub schedule: Schedule,
}

/// OKR session search filters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OkrSessionQuery {
    pub keyword: Option<String>,
    pub status: Option<Status>,
    pub team: Option<EntityLocator>,
}

/// OKR session service
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OkrSessionService: Send + Sync {
    async fn create_session(&self, user: &UserContext, draft: OkrSessionDraft) -> CollabResult<OkrSessionDto>;
    async fn update_session(
        &self,
        user: &UserContext,
        target: EntityLocator,
        changes: OkrSessionChanges,
    ) -> CollabResult<OkrSessionDto>;
    async fn delete_session(&self, user: &UserContext, target: EntityLocator) -> CollabResult<OkrSessionDto>;
    async fn get_session(&self, user: &UserContext, target: EntityLocator) -> CollabResult<OkrSessionDto>;
    async fn search_sessions(
        &self,
        user: &UserContext,
        query: OkrSessionQuery,
    ) -> CollabResult<Listing<OkrSessionDto>>;
}

// ---------------------------------------------------------------------------
// User
// ---------------------------------------------------------------------------

/// User DTO
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDto {
    pub user_id: EntityId,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: Role,
    pub team_id: Option<EntityId>,
    pub prompt_template: String,
}

impl UserDto {
    /// Display name, falling back to the email address
    #[must_use]
    pub fn display_name(&self) -> String {
        match (&self.first_name, &self.last_name) {
            (Some(first), Some(last)) => format!("{first} {last}"),
            (Some(first), None) => first.clone(),
            (None, Some(last)) => last.clone(),
            (None, None) => self.email.clone(),
        }
    }
}

impl EntityDto for UserDto {
    const ENTITY_TYPE: EntityType = EntityType::User;

    fn entity_id(&self) -> &EntityId {
        &self.user_id
    }

    fn title(&self) -> &str {
        &self.email
    }

    fn prompt_template(&self) -> &str {
        &self.prompt_template
    }
}

/// Invitation of a new user into the caller's organization
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invitation {
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: Option<Role>,
    pub team_id: Option<EntityId>,
}

/// User search filters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserQuery {
    pub keyword: Option<String>,
    pub role: Option<Role>,
    pub team: Option<EntityLocator>,
}

/// User service
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserService: Send + Sync {
    async fn invite_user(&self, user: &UserContext, invitation: Invitation) -> CollabResult<UserDto>;
    async fn get_user(&self, user: &UserContext, target: EntityLocator) -> CollabResult<UserDto>;
    async fn search_users(&self, user: &UserContext, query: UserQuery) -> CollabResult<Listing<UserDto>>;
    async fn update_role(&self, user: &UserContext, target: EntityLocator, role: Role) -> CollabResult<UserDto>;
}
