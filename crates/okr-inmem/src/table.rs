//! Tenant-scoped entity table
//!
//! One [`Table`] per entity family. Every row carries the organization that
//! created it; lookups from another organization behave as if the row did
//! not exist.

use dashmap::DashMap;
use okr_dispatch::{CollabResult, CollaboratorError, EntityDto, EntityId, EntityLocator};
use parking_lot::{Mutex, MutexGuard};

struct Row<T> {
    organization_id: String,
    dto: T,
}

/// Rows of one entity family
pub(crate) struct Table<T> {
    rows: DashMap<EntityId, Row<T>>,
    /// Whether a row answers to a human-readable name
    matches: fn(&T, &str) -> bool,
    /// Held across `title_taken` and the write that depends on it
    claims: Mutex<()>,
}

/// Case-insensitive comparison against [`EntityDto::title`]
pub(crate) fn title_matches<T: EntityDto>(dto: &T, title: &str) -> bool {
    dto.title().eq_ignore_ascii_case(title.trim())
}

impl<T: EntityDto + Clone> Table<T> {
    pub(crate) fn new(matches: fn(&T, &str) -> bool) -> Self {
        Self {
            rows: DashMap::new(),
            matches,
            claims: Mutex::new(()),
        }
    }

    /// Serialize a uniqueness check with the write that follows it
    pub(crate) fn claim(&self) -> MutexGuard<'_, ()> {
        self.claims.lock()
    }

    pub(crate) fn insert(&self, organization_id: &str, dto: T) -> T {
        self.rows.insert(
            dto.entity_id().clone(),
            Row {
                organization_id: organization_id.to_string(),
                dto: dto.clone(),
            },
        );
        dto
    }

    /// Resolve a locator to an id; the id wins over the title
    pub(crate) fn find(&self, organization_id: &str, locator: &EntityLocator) -> CollabResult<EntityId> {
        let not_found = || CollaboratorError::not_found(T::ENTITY_TYPE, locator.clone());

        if let Some(id) = &locator.id {
            return match self.rows.get(id) {
                Some(row) if row.organization_id == organization_id => Ok(id.clone()),
                _ => Err(not_found()),
            };
        }

        let Some(title) = &locator.title else {
            return Err(not_found());
        };
        let mut hits = self
            .rows
            .iter()
            .filter(|row| row.organization_id == organization_id && (self.matches)(&row.dto, title))
            .map(|row| row.key().clone());

        match (hits.next(), hits.next()) {
            (Some(id), None) => Ok(id),
            (Some(_), Some(_)) => Err(CollaboratorError::Ambiguous {
                entity: T::ENTITY_TYPE,
                title: title.clone(),
            }),
            (None, _) => Err(not_found()),
        }
    }

    pub(crate) fn get(&self, organization_id: &str, locator: &EntityLocator) -> CollabResult<T> {
        let id = self.find(organization_id, locator)?;
        self.rows
            .get(&id)
            .map(|row| row.dto.clone())
            .ok_or_else(|| CollaboratorError::not_found(T::ENTITY_TYPE, locator.clone()))
    }

    /// Apply `change` to a copy of the row and store it if the change succeeds
    pub(crate) fn update<F>(&self, organization_id: &str, locator: &EntityLocator, change: F) -> CollabResult<T>
    where
        F: FnOnce(&mut T) -> CollabResult<()>,
    {
        let id = self.find(organization_id, locator)?;
        let mut row = self
            .rows
            .get_mut(&id)
            .ok_or_else(|| CollaboratorError::not_found(T::ENTITY_TYPE, locator.clone()))?;
        let mut updated = row.dto.clone();
        change(&mut updated)?;
        row.dto = updated.clone();
        Ok(updated)
    }

    pub(crate) fn remove(&self, organization_id: &str, locator: &EntityLocator) -> CollabResult<T> {
        let id = self.find(organization_id, locator)?;
        self.rows
            .remove(&id)
            .map(|(_, row)| row.dto)
            .ok_or_else(|| CollaboratorError::not_found(T::ENTITY_TYPE, locator.clone()))
    }

    /// Rows of the organization passing `keep`, ordered by title
    pub(crate) fn list<F>(&self, organization_id: &str, keep: F) -> Vec<T>
    where
        F: Fn(&T) -> bool,
    {
        let mut items: Vec<T> = self
            .rows
            .iter()
            .filter(|row| row.organization_id == organization_id && keep(&row.dto))
            .map(|row| row.dto.clone())
            .collect();
        items.sort_by_cached_key(|dto| dto.title().to_lowercase());
        items
    }

    /// Whether another row of the organization already uses `title`
    pub(crate) fn title_taken(&self, organization_id: &str, title: &str, except: Option<&EntityId>) -> bool {
        self.rows.iter().any(|row| {
            row.organization_id == organization_id
                && Some(row.key()) != except
                && (self.matches)(&row.dto, title)
        })
    }

    pub(crate) fn len(&self) -> usize {
        self.rows.len()
    }
}
