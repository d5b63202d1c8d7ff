//! Testing utilities for the OKR dispatch workspace
//!
//! Shared fixtures: caller identities, parameter bags and a dispatcher wired
//! to a fresh in-memory store.

#![allow(missing_docs)]

use okr_dispatch::{ConversationMemory, IntentDispatcher, ParameterBag, Role, Services, UserContext};
use okr_inmem::InMemoryOkrStore;
use std::sync::Arc;

pub const TEST_ORG: &str = "org-test";

/// Dispatcher plus handles on everything it shares
pub struct TestDispatch {
    pub dispatcher: IntentDispatcher,
    pub store: Arc<InMemoryOkrStore>,
    pub memory: ConversationMemory,
}

pub fn user_context() -> UserContext {
    UserContext::new("user-test", TEST_ORG, Role::Admin)
}

pub fn user_in(organization_id: &str, role: Role) -> UserContext {
    UserContext::new("user-test", organization_id, role)
}

pub fn bag(pairs: &[(&str, &str)]) -> ParameterBag {
    pairs.iter().copied().collect()
}

pub fn setup_dispatch() -> TestDispatch {
    setup_dispatch_with(Arc::new(InMemoryOkrStore::new()))
}

pub fn setup_dispatch_with(store: Arc<InMemoryOkrStore>) -> TestDispatch {
    let memory = ConversationMemory::new(1_000);
    let dispatcher = IntentDispatcher::standard(Services::from_backend(store.clone()), memory.clone())
        .unwrap();
    TestDispatch {
        dispatcher,
        store,
        memory,
    }
}
