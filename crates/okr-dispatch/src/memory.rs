//! Per-conversation entity memory using moka
//!
//! Remembers, for each conversation, the most recently created, viewed or
//! changed entity of every type so a later turn can say "update it" without
//! repeating the identifier.
//!
//! The outer cache is keyed by conversation and bounded (size-based eviction
//! plus optional time-to-idle). Each conversation owns a `DashMap` keyed by
//! entity type; writes to the same (conversation, type) pair take that map's
//! shard lock, so concurrent turns never interleave a write.

use crate::config::MemoryConfig;
use crate::types::{ConversationId, EntityId, EntityType};
use dashmap::DashMap;
use moka::future::Cache;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

type Slots = Arc<DashMap<EntityType, EntityId>>;

/// Shared conversation memory handle
///
/// Cloning is cheap; clones share the same underlying store.
#[derive(Debug, Clone)]
pub struct ConversationMemory {
    inner: Cache<ConversationId, Slots>,
}

impl ConversationMemory {
    /// Create memory holding at most `max_conversations` conversations
    #[inline]
    #[must_use]
    pub fn new(max_conversations: u64) -> Self {
        Self {
            inner: Cache::new(max_conversations),
        }
    }

    /// Create memory from configuration
    #[must_use]
    pub fn from_config(config: &MemoryConfig) -> Self {
        Self::with_retention(config.max_conversations, config.idle_timeout())
    }

    /// Create memory with a capacity and an optional idle timeout
    #[must_use]
    pub fn with_retention(max_conversations: u64, idle_timeout: Option<Duration>) -> Self {
        let mut builder = Cache::builder().max_capacity(max_conversations);
        if let Some(idle) = idle_timeout {
            builder = builder.time_to_idle(idle);
        }
        Self {
            inner: builder.build(),
        }
    }

    /// Record the entity most recently touched in a conversation
    pub async fn remember(
        &self,
        conversation_id: &ConversationId,
        entity_type: EntityType,
        entity_id: EntityId,
    ) {
        let slots = self
            .inner
            .get_with(conversation_id.clone(), async { Arc::new(DashMap::new()) })
            .await;
        tracing::debug!(
            conversation_id = %conversation_id,
            entity_type = %entity_type,
            entity_id = %entity_id,
            "remembering entity"
        );
        slots.insert(entity_type, entity_id);
    }

    /// Most recent entity of a type, `None` if never seen
    #[must_use]
    pub async fn recall(
        &self,
        conversation_id: &ConversationId,
        entity_type: EntityType,
    ) -> Option<EntityId> {
        self.inner
            .get(conversation_id)
            .await
            .and_then(|slots| slots.get(&entity_type).map(|id| id.value().clone()))
    }

    /// Drop everything remembered for a conversation
    pub async fn forget(&self, conversation_id: &ConversationId) {
        self.inner.invalidate(conversation_id).await;
    }

    /// Copy of everything remembered for a conversation
    #[must_use]
    pub async fn snapshot(&self, conversation_id: &ConversationId) -> HashMap<EntityType, EntityId> {
        self.inner
            .get(conversation_id)
            .await
            .map(|slots| {
                slots
                    .iter()
                    .map(|entry| (*entry.key(), entry.value().clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Approximate number of tracked conversations
    #[inline]
    #[must_use]
    pub fn conversation_count(&self) -> u64 {
        self.inner.entry_count()
    }

    /// Apply pending evictions and bookkeeping
    pub async fn run_pending_tasks(&self) {
        self.inner.run_pending_tasks().await;
    }
}

impl Default for ConversationMemory {
    fn default() -> Self {
        Self::from_config(&MemoryConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn conv(id: &str) -> ConversationId {
        ConversationId::new(id)
    }

    #[tokio::test]
    async fn recall_unseen_is_none() {
        let memory = ConversationMemory::default();
        assert_eq!(memory.recall(&conv("c1"), EntityType::KeyResult).await, None);
    }

    #[tokio::test]
    async fn remember_then_recall() {
        let memory = ConversationMemory::default();
        memory
            .remember(&conv("c1"), EntityType::KeyResult, EntityId::new("kr1"))
            .await;

        assert_eq!(
            memory.recall(&conv("c1"), EntityType::KeyResult).await,
            Some(EntityId::new("kr1"))
        );
        assert_eq!(memory.recall(&conv("c1"), EntityType::Objective).await, None);
    }

    #[tokio::test]
    async fn last_write_wins() {
        let memory = ConversationMemory::default();
        memory.remember(&conv("c1"), EntityType::Team, EntityId::new("a")).await;
        memory.remember(&conv("c1"), EntityType::Team, EntityId::new("b")).await;

        assert_eq!(
            memory.recall(&conv("c1"), EntityType::Team).await,
            Some(EntityId::new("b"))
        );
    }

    #[tokio::test]
    async fn conversations_are_isolated() {
        let memory = ConversationMemory::default();
        memory.remember(&conv("c1"), EntityType::Team, EntityId::new("a")).await;

        assert_eq!(memory.recall(&conv("c2"), EntityType::Team).await, None);
    }

    #[tokio::test]
    async fn forget_clears_conversation() {
        let memory = ConversationMemory::default();
        memory.remember(&conv("c1"), EntityType::Team, EntityId::new("a")).await;
        memory.remember(&conv("c2"), EntityType::Team, EntityId::new("b")).await;

        memory.forget(&conv("c1")).await;

        assert_eq!(memory.recall(&conv("c1"), EntityType::Team).await, None);
        assert_eq!(
            memory.recall(&conv("c2"), EntityType::Team).await,
            Some(EntityId::new("b"))
        );
    }

    #[tokio::test]
    async fn snapshot_lists_all_types() {
        let memory = ConversationMemory::default();
        memory.remember(&conv("c1"), EntityType::Team, EntityId::new("t")).await;
        memory.remember(&conv("c1"), EntityType::User, EntityId::new("u")).await;

        let snapshot = memory.snapshot(&conv("c1")).await;
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[&EntityType::User], EntityId::new("u"));
        assert!(memory.snapshot(&conv("nope")).await.is_empty());
    }

    #[tokio::test]
    async fn clones_share_state() {
        let memory = ConversationMemory::new(16);
        let other = memory.clone();
        other.remember(&conv("c1"), EntityType::OkrSession, EntityId::new("s")).await;

        memory.run_pending_tasks().await;
        assert_eq!(memory.conversation_count(), 1);
        assert_eq!(
            memory.recall(&conv("c1"), EntityType::OkrSession).await,
            Some(EntityId::new("s"))
        );
    }

    #[tokio::test]
    async fn capacity_bounds_conversations() {
        let memory = ConversationMemory::new(2);
        for id in ["c1", "c2", "c3"] {
            memory.remember(&conv(id), EntityType::Objective, EntityId::new(id)).await;
        }

        memory.run_pending_tasks().await;
        assert!(memory.conversation_count() <= 2);
    }

    #[tokio::test]
    async fn idle_conversations_expire() {
        let memory = ConversationMemory::with_retention(16, Some(Duration::from_millis(50)));
        memory.remember(&conv("c1"), EntityType::Team, EntityId::new("t")).await;
        assert_eq!(memory.recall(&conv("c1"), EntityType::Team).await, Some(EntityId::new("t")));

        tokio::time::sleep(Duration::from_millis(200)).await;
        memory.run_pending_tasks().await;

        assert_eq!(memory.recall(&conv("c1"), EntityType::Team).await, None);
        assert_eq!(memory.conversation_count(), 0);
    }

    #[tokio::test]
    async fn zero_idle_timeout_keeps_conversations() {
        let config = MemoryConfig::default().with_idle_timeout(Some(Duration::ZERO));
        let memory = ConversationMemory::from_config(&config);
        memory.remember(&conv("c1"), EntityType::Team, EntityId::new("t")).await;

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(memory.recall(&conv("c1"), EntityType::Team).await, Some(EntityId::new("t")));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_turns_same_conversation() {
        let memory = ConversationMemory::default();
        let mut tasks = Vec::new();
        for i in 0..64 {
            let memory = memory.clone();
            tasks.push(tokio::spawn(async move {
                let ty = EntityType::ALL[i % EntityType::ALL.len()];
                memory.remember(&conv("busy"), ty, EntityId::new(format!("e{i}"))).await;
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        let snapshot = memory.snapshot(&conv("busy")).await;
        assert_eq!(snapshot.len(), EntityType::ALL.len());
        for (ty, id) in snapshot {
            let index: usize = id.as_str()[1..].parse().unwrap();
            assert_eq!(EntityType::ALL[index % EntityType::ALL.len()], ty);
        }
    }

    proptest! {
        #[test]
        fn recall_returns_latest_write(
            writes in proptest::collection::vec((0usize..3, 0usize..6, "[a-z0-9]{1,6}"), 1..32)
        ) {
            let rt = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();
            rt.block_on(async {
                let memory = ConversationMemory::default();
                let mut expected = HashMap::new();
                for (c, t, id) in &writes {
                    let conversation = conv(&format!("c{c}"));
                    let ty = EntityType::ALL[*t];
                    memory.remember(&conversation, ty, EntityId::new(id.clone())).await;
                    expected.insert((conversation, ty), EntityId::new(id.clone()));
                }
                for c in 0..3 {
                    for ty in EntityType::ALL {
                        let conversation = conv(&format!("c{c}"));
                        let want = expected.get(&(conversation.clone(), ty)).cloned();
                        assert_eq!(memory.recall(&conversation, ty).await, want);
                    }
                }
            });
        }
    }
}
