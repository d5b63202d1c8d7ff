use okr_dispatch::{EntityId, EntityType, ErrorKind, Operation, Role};
use okr_test_utils::{bag, setup_dispatch, user_context, user_in, TEST_ORG};
use pretty_assertions::assert_eq;
use serde_json::json;

async fn create_objective(t: &okr_test_utils::TestDispatch, conversation: &str, title: &str) -> EntityId {
    let env = t
        .dispatcher
        .route(conversation, "CreateObjective", &bag(&[("title", title)]), &user_context())
        .await;
    assert!(env.success, "{}", env.message);
    env.entity_id.unwrap()
}

#[tokio::test]
async fn test_create_objective_populates_memory() {
    let t = setup_dispatch();
    let id = create_objective(&t, "c1", "Grow revenue").await;

    assert_eq!(
        t.memory.recall(&"c1".into(), EntityType::Objective).await,
        Some(id)
    );
}

#[tokio::test]
async fn test_update_recalls_last_objective() {
    let t = setup_dispatch();
    let id = create_objective(&t, "c1", "Grow revenue").await;

    let env = t
        .dispatcher
        .route("c1", "UpdateObjective", &bag(&[("progress", "40%")]), &user_context())
        .await;

    assert!(env.success, "{}", env.message);
    assert_eq!(env.entity_id, Some(id));
    assert_eq!(env.operation, Some(Operation::Update));
    assert_eq!(env.payload["progress"], 40.0);
}

#[tokio::test]
async fn test_recall_is_isolated_per_conversation() {
    let t = setup_dispatch();
    create_objective(&t, "c1", "Grow revenue").await;
    let calls = t.store.call_count();

    let env = t
        .dispatcher
        .route("c2", "UpdateObjective", &bag(&[("progress", "40")]), &user_context())
        .await;

    assert!(!env.success);
    assert_eq!(env.error_kind, Some(ErrorKind::Guidance));
    assert_eq!(t.store.call_count(), calls);
}

#[tokio::test]
async fn test_guidance_does_not_call_collaborators() {
    let t = setup_dispatch();

    for intent in ["UpdateKeyResult", "DeleteTeam", "GetUserInfo", "GetKeyResultTasksByKeyResult"] {
        let env = t.dispatcher.route("fresh", intent, &bag(&[]), &user_context()).await;
        assert_eq!(env.error_kind, Some(ErrorKind::Guidance), "{intent}");
    }
    assert_eq!(t.store.call_count(), 0);
}

#[tokio::test]
async fn test_every_standard_intent_is_routed() {
    let t = setup_dispatch();
    let intents = t.dispatcher.intents();
    assert_eq!(intents.len(), 40);

    for (intent, _) in intents {
        let env = t.dispatcher.route("c1", intent, &bag(&[]), &user_context()).await;
        assert_ne!(env.error_kind, Some(ErrorKind::Unrouted), "{intent}");
    }
    assert_eq!(t.dispatcher.stats().unrouted, 0);
    assert_eq!(t.dispatcher.stats().panicked, 0);
}

#[tokio::test]
async fn test_unknown_intent_is_unrouted() {
    let t = setup_dispatch();
    let env = t
        .dispatcher
        .route("c1", "OrderPizza", &bag(&[("size", "large")]), &user_context())
        .await;

    assert!(!env.success);
    assert_eq!(env.error_kind, Some(ErrorKind::Unrouted));
    assert_eq!(env.message, "I don't know how to handle the 'OrderPizza' intent.");
    assert_eq!(env.payload, serde_json::Value::Null);
    assert_eq!(t.store.call_count(), 0);
}

#[tokio::test]
async fn test_backend_failure_is_contained() {
    let t = setup_dispatch();
    t.store.set_unavailable(Some("database offline".into()));

    let env = t
        .dispatcher
        .route("c1", "CreateObjective", &bag(&[("title", "Grow revenue")]), &user_context())
        .await;

    assert!(!env.success);
    assert_eq!(env.error_kind, Some(ErrorKind::Unexpected));
    assert_eq!(env.message, "Sorry, I couldn't create the objective: database offline");
    assert_eq!(t.memory.recall(&"c1".into(), EntityType::Objective).await, None);
}

#[tokio::test]
async fn test_create_key_result_task_end_to_end() {
    let t = setup_dispatch();
    create_objective(&t, "c1", "Launch product").await;
    let kr = t
        .dispatcher
        .route("c1", "CreateKeyResult", &bag(&[("title", "Ship v1")]), &user_context())
        .await;
    assert!(kr.success, "{}", kr.message);

    let env = t
        .dispatcher
        .route(
            "c1",
            "CreateKeyResultTask",
            &bag(&[("title", "Draft spec"), ("keyResultTitle", "Ship v1")]),
            &user_context(),
        )
        .await;

    assert!(env.success, "{}", env.message);
    let json = serde_json::to_value(&env).unwrap();
    assert_eq!(json["entityType"], "KeyResultTask");
    assert_eq!(json["operation"], "Create");
    assert_eq!(json["payload"]["keyResultId"], json!(kr.entity_id));
    assert_eq!(
        t.memory.recall(&"c1".into(), EntityType::KeyResultTask).await,
        env.entity_id
    );

    let follow_up = t
        .dispatcher
        .route("c1", "UpdateKeyResultTask", &bag(&[("status", "in progress")]), &user_context())
        .await;
    assert!(follow_up.success, "{}", follow_up.message);
    assert_eq!(follow_up.payload["status"], "InProgress");
}

#[tokio::test]
async fn test_missing_parent_is_reported_by_collaborator() {
    let t = setup_dispatch();
    let env = t
        .dispatcher
        .route("c1", "CreateKeyResult", &bag(&[("title", "Ship v1")]), &user_context())
        .await;

    assert_eq!(env.error_kind, Some(ErrorKind::Validation));
    assert!(env.message.contains("objective"));
}

#[tokio::test]
async fn test_unknown_title_is_not_found() {
    let t = setup_dispatch();
    let env = t
        .dispatcher
        .route("c1", "GetTeamInfo", &bag(&[("teamName", "Ghosts")]), &user_context())
        .await;

    assert_eq!(env.error_kind, Some(ErrorKind::NotFound));
    assert_eq!(env.message, "I couldn't find a team matching 'Ghosts'.");
}

#[tokio::test]
async fn test_organizations_do_not_see_each_other() {
    let t = setup_dispatch();
    create_objective(&t, "c1", "Grow revenue").await;

    let outsider = user_in("org-other", Role::Admin);
    let env = t
        .dispatcher
        .route("c9", "GetObjectiveInfo", &bag(&[("title", "Grow revenue")]), &outsider)
        .await;
    assert_eq!(env.error_kind, Some(ErrorKind::NotFound));

    let env = t.dispatcher.route("c9", "GetAllObjectives", &bag(&[]), &outsider).await;
    assert_eq!(env.payload["items"].as_array().map(Vec::len), Some(0));
    assert_ne!(outsider.organization_id, TEST_ORG);
}

#[tokio::test]
async fn test_single_search_hit_is_remembered() {
    let t = setup_dispatch();
    for name in ["Core", "Platform"] {
        let env = t
            .dispatcher
            .route("setup", "CreateTeam", &bag(&[("teamName", name)]), &user_context())
            .await;
        assert!(env.success, "{}", env.message);
    }

    let env = t
        .dispatcher
        .route("c1", "SearchTeams", &bag(&[("query", "plat")]), &user_context())
        .await;
    assert!(env.success);
    assert!(env.entity_id.is_some());

    let env = t
        .dispatcher
        .route("c1", "UpdateTeam", &bag(&[("color", "teal")]), &user_context())
        .await;
    assert!(env.success, "{}", env.message);
    assert_eq!(env.payload["name"], "Platform");
    assert_eq!(env.payload["color"], "teal");
}

#[tokio::test]
async fn test_invite_then_add_to_team() {
    let t = setup_dispatch();
    let team = t
        .dispatcher
        .route("c1", "CreateTeam", &bag(&[("teamName", "Core")]), &user_context())
        .await;
    assert!(team.success);

    let invite = t
        .dispatcher
        .route(
            "c1",
            "InviteUser",
            &bag(&[("email", "ada@example.com"), ("firstName", "Ada"), ("role", "manager")]),
            &user_context(),
        )
        .await;
    assert!(invite.success, "{}", invite.message);
    assert_eq!(invite.operation, Some(Operation::Invite));

    let added = t.dispatcher.route("c1", "AddTeamMember", &bag(&[]), &user_context()).await;
    assert!(added.success, "{}", added.message);
    assert_eq!(added.payload["memberIds"][0], json!(invite.entity_id));

    let again = t.dispatcher.route("c1", "AddTeamMember", &bag(&[]), &user_context()).await;
    assert_eq!(again.error_kind, Some(ErrorKind::Validation));
}

#[tokio::test]
async fn test_stats_track_outcomes() {
    let t = setup_dispatch();
    create_objective(&t, "c1", "Grow revenue").await;
    t.dispatcher.route("c1", "DeleteTeam", &bag(&[]), &user_context()).await;
    t.dispatcher.route("c1", "Dance", &bag(&[]), &user_context()).await;

    let stats = t.dispatcher.stats();
    assert_eq!(stats.routed, 2);
    assert_eq!(stats.succeeded, 1);
    assert_eq!(stats.failed, 1);
    assert_eq!(stats.unrouted, 1);
}


#[tokio::test]
async fn test_task_update_guidance_skips_user_lookup() {
    let t = setup_dispatch();
    let env = t
        .dispatcher
        .route("c1", "UpdateKeyResultTask", &bag(&[("collaboratorName", "Ada")]), &user_context())
        .await;

    assert_eq!(env.error_kind, Some(ErrorKind::Guidance));
    assert_eq!(t.store.call_count(), 0);
}

#[tokio::test]
async fn test_task_update_resolves_collaborator_name() {
    let t = setup_dispatch();
    let ada = t.store.seed_user(TEST_ORG, "ada@example.com", Some("Ada"), Role::Member);
    create_objective(&t, "c1", "Launch product").await;
    for (intent, title) in [("CreateKeyResult", "Ship v1"), ("CreateKeyResultTask", "Draft spec")] {
        let env = t.dispatcher.route("c1", intent, &bag(&[("title", title)]), &user_context()).await;
        assert!(env.success, "{intent}: {}", env.message);
    }

    let env = t
        .dispatcher
        .route("c1", "UpdateKeyResultTask", &bag(&[("collaboratorName", "Ada")]), &user_context())
        .await;
    assert!(env.success, "{}", env.message);
    assert_eq!(env.payload["collaboratorId"], json!(ada.user_id));
}
