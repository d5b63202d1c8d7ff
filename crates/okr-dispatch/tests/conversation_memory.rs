use okr_dispatch::{ConversationMemory, EntityId, EntityType, ErrorKind};
use okr_test_utils::{bag, setup_dispatch, user_context};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use std::sync::Arc;

proptest! {
    #[test]
    fn prop_last_remembered_id_wins(ids in prop::collection::vec("[a-z0-9]{1,12}", 1..20)) {
        let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
        rt.block_on(async {
            let memory = ConversationMemory::new(16);
            let conversation = "c1".into();
            for id in &ids {
                memory.remember(&conversation, EntityType::KeyResult, EntityId::new(id.as_str())).await;
            }
            let last = ids.last().map(|id| EntityId::new(id.as_str()));
            assert_eq!(memory.recall(&conversation, EntityType::KeyResult).await, last);
            assert_eq!(memory.recall(&conversation, EntityType::Objective).await, None);
        });
    }

    #[test]
    fn prop_conversations_never_share_slots(a in "[a-z]{1,8}", b in "[A-Z]{1,8}") {
        let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
        rt.block_on(async {
            let memory = ConversationMemory::new(16);
            memory.remember(&a.as_str().into(), EntityType::Team, EntityId::new("t-a")).await;
            assert_eq!(memory.recall(&b.as_str().into(), EntityType::Team).await, None);
        });
    }
}

#[tokio::test]
async fn test_forget_clears_recall() {
    let t = setup_dispatch();
    let env = t
        .dispatcher
        .route("c1", "CreateTeam", &bag(&[("teamName", "Core")]), &user_context())
        .await;
    assert!(env.success, "{}", env.message);

    t.memory.forget(&"c1".into()).await;

    let env = t.dispatcher.route("c1", "GetTeamInfo", &bag(&[]), &user_context()).await;
    assert_eq!(env.error_kind, Some(ErrorKind::Guidance));
}

#[tokio::test]
async fn test_snapshot_tracks_each_family() {
    let t = setup_dispatch();
    for (intent, key, title) in [
        ("CreateTeam", "teamName", "Core"),
        ("CreateOkrSession", "title", "Q3"),
        ("CreateObjective", "title", "Grow revenue"),
        ("CreateKeyResult", "title", "Ship v1"),
        ("CreateKeyResultTask", "title", "Draft spec"),
    ] {
        let env = t.dispatcher.route("c1", intent, &bag(&[(key, title)]), &user_context()).await;
        assert!(env.success, "{intent}: {}", env.message);
    }

    let snapshot = t.memory.snapshot(&"c1".into()).await;
    assert_eq!(snapshot.len(), 5);
    assert!(!snapshot.contains_key(&EntityType::User));
}

#[tokio::test]
async fn test_delete_leaves_id_for_follow_up() {
    let t = setup_dispatch();
    let created = t
        .dispatcher
        .route("c1", "CreateObjective", &bag(&[("title", "Grow revenue")]), &user_context())
        .await;
    let deleted = t.dispatcher.route("c1", "DeleteObjective", &bag(&[]), &user_context()).await;
    assert!(deleted.success, "{}", deleted.message);
    assert_eq!(deleted.entity_id, created.entity_id);

    let again = t.dispatcher.route("c1", "GetObjectiveInfo", &bag(&[]), &user_context()).await;
    assert_eq!(again.error_kind, Some(ErrorKind::NotFound));
}

#[tokio::test]
async fn test_explicit_title_beats_memory() {
    let t = setup_dispatch();
    for title in ["Grow revenue", "Cut churn"] {
        t.dispatcher
            .route("c1", "CreateObjective", &bag(&[("title", title)]), &user_context())
            .await;
    }

    let env = t
        .dispatcher
        .route("c1", "GetObjectiveInfo", &bag(&[("objectiveTitle", "grow revenue")]), &user_context())
        .await;
    assert!(env.success, "{}", env.message);
    assert_eq!(env.payload["title"], "Grow revenue");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_conversations_stay_isolated() {
    let t = Arc::new(setup_dispatch());
    let mut tasks = Vec::new();
    for n in 0..16 {
        let t = Arc::clone(&t);
        tasks.push(tokio::spawn(async move {
            let conversation = format!("c{n}");
            let title = format!("Objective {n}");
            let created = t
                .dispatcher
                .route(&conversation, "CreateObjective", &bag(&[("title", title.as_str())]), &user_context())
                .await;
            let viewed = t
                .dispatcher
                .route(&conversation, "GetObjectiveInfo", &bag(&[]), &user_context())
                .await;
            (created.entity_id, viewed.entity_id, viewed.payload["title"].clone(), title)
        }));
    }

    for task in tasks {
        let (created, viewed, shown, title) = task.await.unwrap();
        assert!(created.is_some());
        assert_eq!(created, viewed);
        assert_eq!(shown, title);
    }
    assert_eq!(t.store.entity_count(EntityType::Objective), 16);
    t.memory.run_pending_tasks().await;
    assert_eq!(t.memory.conversation_count(), 16);
}
