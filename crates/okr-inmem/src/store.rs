//! In-memory OKR store
//!
//! Provides [`InMemoryOkrStore`], a reference backend for every collaborator
//! trait. Rows are isolated per organization, titles are matched
//! case-insensitively, and a handful of business rules are enforced so the
//! dispatch layer sees realistic validation failures.

use crate::render::{listing, stamp};
use crate::table::{title_matches, Table};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use okr_dispatch::{
    CollabResult, CollaboratorError, EntityId, EntityLocator, EntityType, Invitation, KeyResultChanges,
    KeyResultDraft, KeyResultDto, KeyResultQuery, KeyResultService, KeyResultTaskChanges, KeyResultTaskDraft,
    KeyResultTaskDto, KeyResultTaskQuery, KeyResultTaskService, Listing, ObjectiveChanges, ObjectiveDraft,
    ObjectiveDto, ObjectiveQuery, ObjectiveService, OkrSessionChanges, OkrSessionDraft, OkrSessionDto,
    OkrSessionQuery, OkrSessionService, Operation, Role, Schedule, Status, TeamChanges, TeamDraft, TeamDto,
    TeamQuery, TeamService, UserContext, UserDto, UserQuery, UserService,
};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};

/// Tenant-isolated in-memory OKR backend
pub struct InMemoryOkrStore {
    objectives: Table<ObjectiveDto>,
    key_results: Table<KeyResultDto>,
    tasks: Table<KeyResultTaskDto>,
    teams: Table<TeamDto>,
    sessions: Table<OkrSessionDto>,
    users: Table<UserDto>,
    unavailable: RwLock<Option<String>>,
    calls: AtomicU64,
}

impl Default for InMemoryOkrStore {
    fn default() -> Self {
        Self::new()
    }
}

fn user_matches(user: &UserDto, name: &str) -> bool {
    title_matches(user, name) || user.display_name().eq_ignore_ascii_case(name.trim())
}

fn contains_keyword(keyword: Option<&str>, fields: &[Option<&str>]) -> bool {
    let Some(keyword) = keyword.map(str::trim).filter(|k| !k.is_empty()) else {
        return true;
    };
    let needle = keyword.to_lowercase();
    fields
        .iter()
        .flatten()
        .any(|field| field.to_lowercase().contains(&needle))
}

fn check_dates(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> CollabResult<()> {
    match (start, end) {
        (Some(start), Some(end)) if end < start => Err(CollaboratorError::validation(
            "The end date can't be before the start date.",
        )),
        _ => Ok(()),
    }
}

fn clamp_progress(progress: f64) -> f64 {
    progress.clamp(0.0, 100.0)
}

/// Mutable schedule fields of a stored row
struct Timebox<'a> {
    start_date: &'a mut Option<DateTime<Utc>>,
    end_date: &'a mut Option<DateTime<Utc>>,
    status: &'a mut Status,
    progress: Option<&'a mut f64>,
}

impl Timebox<'_> {
    fn apply(self, schedule: &Schedule) -> CollabResult<()> {
        let start = schedule.start_date.or(*self.start_date);
        let end = schedule.end_date.or(*self.end_date);
        check_dates(start, end)?;
        *self.start_date = start;
        *self.end_date = end;
        if let Some(status) = schedule.status {
            *self.status = status;
        }
        if let (Some(progress), Some(slot)) = (schedule.progress, self.progress) {
            *slot = clamp_progress(progress);
        }
        Ok(())
    }
}

fn replace_text(slot: &mut String, value: Option<&String>) {
    if let Some(value) = value {
        *slot = value.clone();
    }
}

fn replace_opt<T: Clone>(slot: &mut Option<T>, value: Option<&T>) {
    if let Some(value) = value {
        *slot = Some(value.clone());
    }
}

impl InMemoryOkrStore {
    /// Create empty store
    #[must_use]
    pub fn new() -> Self {
        Self {
            objectives: Table::new(title_matches),
            key_results: Table::new(title_matches),
            tasks: Table::new(title_matches),
            teams: Table::new(title_matches),
            sessions: Table::new(title_matches),
            users: Table::new(user_matches),
            unavailable: RwLock::new(None),
            calls: AtomicU64::new(0),
        }
    }

    /// Make every call fail with a backend error until reset with `None`
    pub fn set_unavailable(&self, reason: Option<String>) {
        *self.unavailable.write() = reason;
    }

    /// Number of collaborator calls received
    #[must_use]
    pub fn call_count(&self) -> u64 {
        self.calls.load(Ordering::Relaxed)
    }

    /// Number of stored rows of one family, across all organizations
    #[must_use]
    pub fn entity_count(&self, entity: EntityType) -> usize {
        match entity {
            EntityType::Objective => self.objectives.len(),
            EntityType::KeyResult => self.key_results.len(),
            EntityType::KeyResultTask => self.tasks.len(),
            EntityType::Team => self.teams.len(),
            EntityType::OkrSession => self.sessions.len(),
            EntityType::User => self.users.len(),
        }
    }

    /// Add a user directly, bypassing invitation rules
    pub fn seed_user(&self, organization_id: &str, email: &str, first_name: Option<&str>, role: Role) -> UserDto {
        let dto = UserDto {
            user_id: EntityId::generate(),
            email: email.to_string(),
            first_name: first_name.map(str::to_string),
            last_name: None,
            role,
            team_id: None,
            prompt_template: String::new(),
        };
        self.users.insert(organization_id, stamp(dto, Operation::Create))
    }

    fn enter(&self, call: &'static str) -> CollabResult<()> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        if let Some(reason) = self.unavailable.read().as_ref() {
            tracing::warn!(call, reason = %reason, "store unavailable");
            return Err(CollaboratorError::backend(reason.clone()));
        }
        tracing::trace!(call, "store call");
        Ok(())
    }

    fn resolve<T>(table: &Table<T>, org: &str, locator: Option<&EntityLocator>) -> CollabResult<Option<EntityId>>
    where
        T: okr_dispatch::EntityDto + Clone,
    {
        locator.map(|locator| table.find(org, locator)).transpose()
    }

    fn require_user(&self, org: &str, id: Option<&EntityId>) -> CollabResult<()> {
        if let Some(id) = id {
            self.users.find(org, &EntityLocator::by_id(id.clone()))?;
        }
        Ok(())
    }
}

#[async_trait]
impl ObjectiveService for InMemoryOkrStore {
    async fn create_objective(&self, user: &UserContext, draft: ObjectiveDraft) -> CollabResult<ObjectiveDto> {
        self.enter("create_objective")?;
        let org = &user.organization_id;
        let okr_session_id = Self::resolve(&self.sessions, org, draft.okr_session.as_ref())?;
        check_dates(draft.schedule.start_date, draft.schedule.end_date)?;

        let dto = ObjectiveDto {
            objective_id: EntityId::generate(),
            title: draft.title,
            description: draft.description,
            okr_session_id,
            status: draft.schedule.status.unwrap_or_default(),
            progress: clamp_progress(draft.schedule.progress.unwrap_or(0.0)),
            start_date: draft.schedule.start_date,
            end_date: draft.schedule.end_date,
            prompt_template: String::new(),
        };
        Ok(self.objectives.insert(org, stamp(dto, Operation::Create)))
    }

    async fn update_objective(
        &self,
        user: &UserContext,
        target: EntityLocator,
        changes: ObjectiveChanges,
    ) -> CollabResult<ObjectiveDto> {
        self.enter("update_objective")?;
        let updated = self.objectives.update(&user.organization_id, &target, |dto| {
            replace_text(&mut dto.title, changes.new_title.as_ref());
            replace_opt(&mut dto.description, changes.description.as_ref());
            Timebox {
                start_date: &mut dto.start_date,
                end_date: &mut dto.end_date,
                status: &mut dto.status,
                progress: Some(&mut dto.progress),
            }
            .apply(&changes.schedule)
        })?;
        Ok(stamp(updated, Operation::Update))
    }

    async fn delete_objective(&self, user: &UserContext, target: EntityLocator) -> CollabResult<ObjectiveDto> {
        self.enter("delete_objective")?;
        let removed = self.objectives.remove(&user.organization_id, &target)?;
        Ok(stamp(removed, Operation::Delete))
    }

    async fn get_objective(&self, user: &UserContext, target: EntityLocator) -> CollabResult<ObjectiveDto> {
        self.enter("get_objective")?;
        let dto = self.objectives.get(&user.organization_id, &target)?;
        Ok(stamp(dto, Operation::View))
    }

    async fn search_objectives(
        &self,
        user: &UserContext,
        query: ObjectiveQuery,
    ) -> CollabResult<Listing<ObjectiveDto>> {
        self.enter("search_objectives")?;
        let org = &user.organization_id;
        let session = Self::resolve(&self.sessions, org, query.okr_session.as_ref())?;
        let items = self.objectives.list(org, |dto| {
            contains_keyword(query.keyword.as_deref(), &[Some(dto.title.as_str()), dto.description.as_deref()])
                && query.status.map_or(true, |status| dto.status == status)
                && session.as_ref().map_or(true, |id| dto.okr_session_id.as_ref() == Some(id))
        });
        Ok(listing(items))
    }
}

#[async_trait]
impl KeyResultService for InMemoryOkrStore {
    async fn create_key_result(&self, user: &UserContext, draft: KeyResultDraft) -> CollabResult<KeyResultDto> {
        self.enter("create_key_result")?;
        let org = &user.organization_id;
        let Some(objective) = draft.objective.as_ref() else {
            return Err(CollaboratorError::validation(
                "A key result must belong to an objective. Which objective is it for?",
            ));
        };
        let objective_id = self.objectives.find(org, objective)?;
        check_dates(draft.schedule.start_date, draft.schedule.end_date)?;

        let dto = KeyResultDto {
            key_result_id: EntityId::generate(),
            title: draft.title,
            description: draft.description,
            objective_id,
            status: draft.schedule.status.unwrap_or_default(),
            progress: clamp_progress(draft.schedule.progress.unwrap_or(0.0)),
            start_date: draft.schedule.start_date,
            end_date: draft.schedule.end_date,
            prompt_template: String::new(),
        };
        Ok(self.key_results.insert(org, stamp(dto, Operation::Create)))
    }

    async fn update_key_result(
        &self,
        user: &UserContext,
        target: EntityLocator,
        changes: KeyResultChanges,
    ) -> CollabResult<KeyResultDto> {
        self.enter("update_key_result")?;
        let updated = self.key_results.update(&user.organization_id, &target, |dto| {
            replace_text(&mut dto.title, changes.new_title.as_ref());
            replace_opt(&mut dto.description, changes.description.as_ref());
            Timebox {
                start_date: &mut dto.start_date,
                end_date: &mut dto.end_date,
                status: &mut dto.status,
                progress: Some(&mut dto.progress),
            }
            .apply(&changes.schedule)
        })?;
        Ok(stamp(updated, Operation::Update))
    }

    async fn delete_key_result(&self, user: &UserContext, target: EntityLocator) -> CollabResult<KeyResultDto> {
        self.enter("delete_key_result")?;
        let removed = self.key_results.remove(&user.organization_id, &target)?;
        Ok(stamp(removed, Operation::Delete))
    }

    async fn get_key_result(&self, user: &UserContext, target: EntityLocator) -> CollabResult<KeyResultDto> {
        self.enter("get_key_result")?;
        let dto = self.key_results.get(&user.organization_id, &target)?;
        Ok(stamp(dto, Operation::View))
    }

    async fn search_key_results(
        &self,
        user: &UserContext,
        query: KeyResultQuery,
    ) -> CollabResult<Listing<KeyResultDto>> {
        self.enter("search_key_results")?;
        let org = &user.organization_id;
        let objective = Self::resolve(&self.objectives, org, query.objective.as_ref())?;
        let items = self.key_results.list(org, |dto| {
            contains_keyword(query.keyword.as_deref(), &[Some(dto.title.as_str()), dto.description.as_deref()])
                && query.status.map_or(true, |status| dto.status == status)
                && objective.as_ref().map_or(true, |id| dto.objective_id == *id)
        });
        Ok(listing(items))
    }
}

#[async_trait]
impl KeyResultTaskService for InMemoryOkrStore {
    async fn create_task(&self, user: &UserContext, draft: KeyResultTaskDraft) -> CollabResult<KeyResultTaskDto> {
        self.enter("create_task")?;
        let org = &user.organization_id;
        let Some(key_result) = draft.key_result.as_ref() else {
            return Err(CollaboratorError::validation(
                "A task must belong to a key result. Which key result is it for?",
            ));
        };
        let key_result_id = self.key_results.find(org, key_result)?;
        self.require_user(org, draft.collaborator_id.as_ref())?;
        check_dates(draft.schedule.start_date, draft.schedule.end_date)?;

        let dto = KeyResultTaskDto {
            key_result_task_id: EntityId::generate(),
            title: draft.title,
            description: draft.description,
            key_result_id,
            collaborator_id: draft.collaborator_id,
            priority: draft.priority.unwrap_or_default(),
            status: draft.schedule.status.unwrap_or_default(),
            progress: clamp_progress(draft.schedule.progress.unwrap_or(0.0)),
            start_date: draft.schedule.start_date,
            end_date: draft.schedule.end_date,
            prompt_template: String::new(),
        };
        Ok(self.tasks.insert(org, stamp(dto, Operation::Create)))
    }

    async fn update_task(
        &self,
        user: &UserContext,
        target: EntityLocator,
        changes: KeyResultTaskChanges,
    ) -> CollabResult<KeyResultTaskDto> {
        self.enter("update_task")?;
        let org = &user.organization_id;
        self.require_user(org, changes.collaborator_id.as_ref())?;
        let updated = self.tasks.update(org, &target, |dto| {
            replace_text(&mut dto.title, changes.new_title.as_ref());
            replace_opt(&mut dto.description, changes.description.as_ref());
            replace_opt(&mut dto.collaborator_id, changes.collaborator_id.as_ref());
            if let Some(priority) = changes.priority {
                dto.priority = priority;
            }
            Timebox {
                start_date: &mut dto.start_date,
                end_date: &mut dto.end_date,
                status: &mut dto.status,
                progress: Some(&mut dto.progress),
            }
            .apply(&changes.schedule)
        })?;
        Ok(stamp(updated, Operation::Update))
    }

    async fn delete_task(&self, user: &UserContext, target: EntityLocator) -> CollabResult<KeyResultTaskDto> {
        self.enter("delete_task")?;
        let removed = self.tasks.remove(&user.organization_id, &target)?;
        Ok(stamp(removed, Operation::Delete))
    }

    async fn get_task(&self, user: &UserContext, target: EntityLocator) -> CollabResult<KeyResultTaskDto> {
        self.enter("get_task")?;
        let dto = self.tasks.get(&user.organization_id, &target)?;
        Ok(stamp(dto, Operation::View))
    }

    async fn search_tasks(
        &self,
        user: &UserContext,
        query: KeyResultTaskQuery,
    ) -> CollabResult<Listing<KeyResultTaskDto>> {
        self.enter("search_tasks")?;
        let org = &user.organization_id;
        let key_result = Self::resolve(&self.key_results, org, query.key_result.as_ref())?;
        let items = self.tasks.list(org, |dto| {
            contains_keyword(query.keyword.as_deref(), &[Some(dto.title.as_str()), dto.description.as_deref()])
                && query.status.map_or(true, |status| dto.status == status)
                && query.priority.map_or(true, |priority| dto.priority == priority)
                && key_result.as_ref().map_or(true, |id| dto.key_result_id == *id)
        });
        Ok(listing(items))
    }
}

#[async_trait]
impl TeamService for InMemoryOkrStore {
    async fn create_team(&self, user: &UserContext, draft: TeamDraft) -> CollabResult<TeamDto> {
        self.enter("create_team")?;
        let org = &user.organization_id;
        let _claim = self.teams.claim();
        if self.teams.title_taken(org, &draft.name, None) {
            return Err(CollaboratorError::validation(format!(
                "A team called '{}' already exists.",
                draft.name
            )));
        }
        let dto = TeamDto {
            team_id: EntityId::generate(),
            name: draft.name,
            description: draft.description,
            color: draft.color,
            member_ids: Vec::new(),
            prompt_template: String::new(),
        };
        Ok(self.teams.insert(org, stamp(dto, Operation::Create)))
    }

    async fn update_team(&self, user: &UserContext, target: EntityLocator, changes: TeamChanges) -> CollabResult<TeamDto> {
        self.enter("update_team")?;
        let org = &user.organization_id;
        let id = self.teams.find(org, &target)?;
        let _claim = self.teams.claim();
        if let Some(name) = &changes.new_name {
            if self.teams.title_taken(org, name, Some(&id)) {
                return Err(CollaboratorError::validation(format!(
                    "A team called '{name}' already exists."
                )));
            }
        }
        let updated = self.teams.update(org, &EntityLocator::by_id(id), |dto| {
            replace_text(&mut dto.name, changes.new_name.as_ref());
            replace_opt(&mut dto.description, changes.description.as_ref());
            replace_opt(&mut dto.color, changes.color.as_ref());
            Ok(())
        })?;
        Ok(stamp(updated, Operation::Update))
    }

    async fn delete_team(&self, user: &UserContext, target: EntityLocator) -> CollabResult<TeamDto> {
        self.enter("delete_team")?;
        let removed = self.teams.remove(&user.organization_id, &target)?;
        Ok(stamp(removed, Operation::Delete))
    }

    async fn get_team(&self, user: &UserContext, target: EntityLocator) -> CollabResult<TeamDto> {
        self.enter("get_team")?;
        let dto = self.teams.get(&user.organization_id, &target)?;
        Ok(stamp(dto, Operation::View))
    }

    async fn search_teams(&self, user: &UserContext, query: TeamQuery) -> CollabResult<Listing<TeamDto>> {
        self.enter("search_teams")?;
        let items = self.teams.list(&user.organization_id, |dto| {
            contains_keyword(query.keyword.as_deref(), &[Some(dto.name.as_str()), dto.description.as_deref()])
        });
        Ok(listing(items))
    }

    async fn add_member(&self, user: &UserContext, team: EntityLocator, member: EntityLocator) -> CollabResult<TeamDto> {
        self.enter("add_member")?;
        let org = &user.organization_id;
        let member = self.users.get(org, &member)?;
        let updated = self.teams.update(org, &team, |dto| {
            if dto.member_ids.contains(&member.user_id) {
                return Err(CollaboratorError::validation(format!(
                    "'{}' is already a member of team '{}'.",
                    member.email, dto.name
                )));
            }
            dto.member_ids.push(member.user_id.clone());
            Ok(())
        })?;
        Ok(stamp(updated, Operation::Update))
    }

    async fn remove_member(
        &self,
        user: &UserContext,
        team: EntityLocator,
        member: EntityLocator,
    ) -> CollabResult<TeamDto> {
        self.enter("remove_member")?;
        let org = &user.organization_id;
        let member = self.users.get(org, &member)?;
        let updated = self.teams.update(org, &team, |dto| {
            let before = dto.member_ids.len();
            dto.member_ids.retain(|id| *id != member.user_id);
            if dto.member_ids.len() == before {
                return Err(CollaboratorError::validation(format!(
                    "'{}' is not a member of team '{}'.",
                    member.email, dto.name
                )));
            }
            Ok(())
        })?;
        Ok(stamp(updated, Operation::Update))
    }
}

#[async_trait]
impl OkrSessionService for InMemoryOkrStore {
    async fn create_session(&self, user: &UserContext, draft: OkrSessionDraft) -> CollabResult<OkrSessionDto> {
        self.enter("create_session")?;
        let org = &user.organization_id;
        let team_id = Self::resolve(&self.teams, org, draft.team.as_ref())?;
        check_dates(draft.schedule.start_date, draft.schedule.end_date)?;

        let dto = OkrSessionDto {
            okr_session_id: EntityId::generate(),
            title: draft.title,
            description: draft.description,
            team_id,
            status: draft.schedule.status.unwrap_or_default(),
            start_date: draft.schedule.start_date,
            end_date: draft.schedule.end_date,
            prompt_template: String::new(),
        };
        Ok(self.sessions.insert(org, stamp(dto, Operation::Create)))
    }

    async fn update_session(
        &self,
        user: &UserContext,
        target: EntityLocator,
        changes: OkrSessionChanges,
    ) -> CollabResult<OkrSessionDto> {
        self.enter("update_session")?;
        let updated = self.sessions.update(&user.organization_id, &target, |dto| {
            replace_text(&mut dto.title, changes.new_title.as_ref());
            replace_opt(&mut dto.description, changes.description.as_ref());
            Timebox {
                start_date: &mut dto.start_date,
                end_date: &mut dto.end_date,
                status: &mut dto.status,
                progress: None,
            }
            .apply(&changes.schedule)
        })?;
        Ok(stamp(updated, Operation::Update))
    }

    async fn delete_session(&self, user: &UserContext, target: EntityLocator) -> CollabResult<OkrSessionDto> {
        self.enter("delete_session")?;
        let removed = self.sessions.remove(&user.organization_id, &target)?;
        Ok(stamp(removed, Operation::Delete))
    }

    async fn get_session(&self, user: &UserContext, target: EntityLocator) -> CollabResult<OkrSessionDto> {
        self.enter("get_session")?;
        let dto = self.sessions.get(&user.organization_id, &target)?;
        Ok(stamp(dto, Operation::View))
    }

    async fn search_sessions(
        &self,
        user: &UserContext,
        query: OkrSessionQuery,
    ) -> CollabResult<Listing<OkrSessionDto>> {
        self.enter("search_sessions")?;
        let org = &user.organization_id;
        let team = Self::resolve(&self.teams, org, query.team.as_ref())?;
        let items = self.sessions.list(org, |dto| {
            contains_keyword(query.keyword.as_deref(), &[Some(dto.title.as_str()), dto.description.as_deref()])
                && query.status.map_or(true, |status| dto.status == status)
                && team.as_ref().map_or(true, |id| dto.team_id.as_ref() == Some(id))
        });
        Ok(listing(items))
    }
}

#[async_trait]
impl UserService for InMemoryOkrStore {
    async fn invite_user(&self, user: &UserContext, invitation: Invitation) -> CollabResult<UserDto> {
        self.enter("invite_user")?;
        let org = &user.organization_id;
        if user.role == Role::Viewer {
            return Err(CollaboratorError::Forbidden("Viewers can't invite users.".to_string()));
        }
        let email = invitation.email.trim();
        if !email.contains('@') || email.contains(char::is_whitespace) {
            return Err(CollaboratorError::validation(format!(
                "'{email}' doesn't look like an email address."
            )));
        }
        let _claim = self.users.claim();
        if self.users.title_taken(org, email, None) {
            return Err(CollaboratorError::validation(format!(
                "A user with email '{email}' already exists."
            )));
        }

        let user_id = EntityId::generate();
        // Join the team before the user row exists.
        let team_id = match invitation.team_id {
            Some(team_id) => {
                let team = self.teams.update(org, &EntityLocator::by_id(team_id), |team| {
                    team.member_ids.push(user_id.clone());
                    Ok(())
                })?;
                Some(team.team_id)
            }
            None => None,
        };
        let dto = UserDto {
            user_id,
            email: email.to_string(),
            first_name: invitation.first_name,
            last_name: invitation.last_name,
            role: invitation.role.unwrap_or_default(),
            team_id,
            prompt_template: String::new(),
        };
        let dto = self.users.insert(org, stamp(dto, Operation::Invite));
        tracing::debug!(organization_id = %org, user_id = %dto.user_id, "user invited");
        Ok(dto)
    }

    async fn get_user(&self, user: &UserContext, target: EntityLocator) -> CollabResult<UserDto> {
        self.enter("get_user")?;
        let dto = self.users.get(&user.organization_id, &target)?;
        Ok(stamp(dto, Operation::View))
    }

    async fn search_users(&self, user: &UserContext, query: UserQuery) -> CollabResult<Listing<UserDto>> {
        self.enter("search_users")?;
        let org = &user.organization_id;
        let members = match query.team.as_ref() {
            Some(team) => Some(self.teams.get(org, team)?),
            None => None,
        };
        let items = self.users.list(org, |dto| {
            contains_keyword(
                query.keyword.as_deref(),
                &[Some(dto.email.as_str()), dto.first_name.as_deref(), dto.last_name.as_deref()],
            ) && query.role.map_or(true, |role| dto.role == role)
                && members.as_ref().map_or(true, |team| {
                    team.member_ids.contains(&dto.user_id) || dto.team_id.as_ref() == Some(&team.team_id)
                })
        });
        Ok(listing(items))
    }

    async fn update_role(&self, user: &UserContext, target: EntityLocator, role: Role) -> CollabResult<UserDto> {
        self.enter("update_role")?;
        if user.role != Role::Admin {
            return Err(CollaboratorError::Forbidden(
                "Only administrators can change user roles.".to_string(),
            ));
        }
        let updated = self.users.update(&user.organization_id, &target, |dto| {
            dto.role = role;
            Ok(())
        })?;
        Ok(stamp(updated, Operation::Update))
    }
}
