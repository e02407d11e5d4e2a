//! In-memory backend tests.

use llm::Role;
use narwhal_store::{
    ActiveModel, CacheKey, Completion, CompletionStore, CredentialStore, HistoryStore, MemoryStore,
    ModelConfig, ModelRegistry, ProjectSnapshot, ProjectStore, StaticCredentials, Turn, now_unix,
};

fn completion(reply: &str) -> Completion {
    Completion {
        id: "c1".into(),
        created: now_unix(),
        reply: reply.into(),
        finish_reason: Default::default(),
    }
}

#[tokio::test]
async fn history_appends_in_order() {
    let store = MemoryStore::new();
    store.append("p1", Turn::user("one")).await.unwrap();
    store.append("p1", Turn::assistant("two")).await.unwrap();

    let turns = store.list("p1").await.unwrap();
    assert_eq!(turns.len(), 2);
    assert_eq!(turns[0].role, Role::User);
    assert_eq!(turns[0].content, "one");
    assert_eq!(turns[1].role, Role::Assistant);
    assert_eq!(turns[1].content, "two");
}

#[tokio::test]
async fn clear_only_touches_one_conversation() {
    let store = MemoryStore::new();
    store.append("p1", Turn::user("a")).await.unwrap();
    store.append("p2", Turn::user("b")).await.unwrap();

    store.clear("p1").await.unwrap();
    assert!(store.list("p1").await.unwrap().is_empty());
    assert_eq!(store.list("p2").await.unwrap().len(), 1);
}

#[tokio::test]
async fn completion_store_and_purge_scoping() {
    let store = MemoryStore::new();
    let k1 = CacheKey::new("p1", "q", "m1");
    let k2 = CacheKey::new("p2", "q", "m1");
    store.store(&k1, &completion("a1")).await.unwrap();
    store.store(&k2, &completion("a2")).await.unwrap();

    store.purge("p1").await.unwrap();
    assert!(store.lookup(&k1).await.unwrap().is_none());
    assert_eq!(store.lookup(&k2).await.unwrap().unwrap().reply, "a2");
}

#[tokio::test]
async fn project_upsert_and_get() {
    let store = MemoryStore::new();
    assert!(store.get("p1").await.unwrap().is_none());

    let snapshot = ProjectSnapshot {
        name: "Apollo".into(),
        description: "Lunar program".into(),
        status: "active".into(),
    };
    store.put("p1", &snapshot).await.unwrap();
    assert_eq!(store.get("p1").await.unwrap().unwrap(), snapshot);
}

#[tokio::test]
async fn static_credentials() {
    let set = StaticCredentials::new("sk-test");
    assert_eq!(set.get().await.unwrap().unwrap().as_str(), "sk-test");

    let blank = StaticCredentials::new("   ");
    assert!(blank.get().await.unwrap().is_none());
    assert!(StaticCredentials::empty().get().await.unwrap().is_none());
}

#[tokio::test]
async fn active_model_swaps_at_runtime() {
    let registry = ActiveModel::new(ModelConfig::new("m1"));
    assert_eq!(registry.active().await.unwrap().id, "m1");

    registry.set(ModelConfig::new("m2"));
    assert_eq!(registry.active().await.unwrap().id, "m2");
}
