//! SQLite backend tests.

use llm::{FinishReason, Role};
use narwhal_store::{
    CacheKey, Completion, CompletionStore, HistoryStore, ProjectSnapshot, ProjectStore,
    SqliteStore, Turn, now_unix,
};

fn completion(reply: &str) -> Completion {
    Completion {
        id: "c1".into(),
        created: now_unix(),
        reply: reply.into(),
        finish_reason: FinishReason::Stop,
    }
}

#[tokio::test]
async fn history_round_trip() {
    let store = SqliteStore::in_memory().unwrap();
    store.append("p1", Turn::user("hello")).await.unwrap();
    store.append("p1", Turn::assistant("hi there")).await.unwrap();

    let turns = store.list("p1").await.unwrap();
    assert_eq!(turns.len(), 2);
    assert_eq!(turns[0].role, Role::User);
    assert_eq!(turns[1].role, Role::Assistant);
    assert_eq!(turns[1].content, "hi there");
}

#[tokio::test]
async fn clear_is_scoped_to_conversation() {
    let store = SqliteStore::in_memory().unwrap();
    store.append("p1", Turn::user("a")).await.unwrap();
    store.append("p2", Turn::user("b")).await.unwrap();

    store.clear("p1").await.unwrap();
    assert!(store.list("p1").await.unwrap().is_empty());
    assert_eq!(store.list("p2").await.unwrap().len(), 1);
}

#[tokio::test]
async fn completion_lookup_by_triple() {
    let store = SqliteStore::in_memory().unwrap();
    let key = CacheKey::new("proj-42", "What's next?", "m1");
    assert!(store.lookup(&key).await.unwrap().is_none());

    store.store(&key, &completion("Ship it.")).await.unwrap();
    let hit = store.lookup(&key).await.unwrap().unwrap();
    assert_eq!(hit.reply, "Ship it.");
    assert_eq!(hit.finish_reason, FinishReason::Stop);

    // A different model id is a different key.
    let other = CacheKey::new("proj-42", "What's next?", "m2");
    assert!(store.lookup(&other).await.unwrap().is_none());
}

#[tokio::test]
async fn completion_store_replaces_existing() {
    let store = SqliteStore::in_memory().unwrap();
    let key = CacheKey::new("p1", "q", "m1");
    store.store(&key, &completion("old")).await.unwrap();
    store.store(&key, &completion("new")).await.unwrap();
    assert_eq!(store.lookup(&key).await.unwrap().unwrap().reply, "new");
}

#[tokio::test]
async fn purge_is_scoped_to_conversation() {
    let store = SqliteStore::in_memory().unwrap();
    let k1 = CacheKey::new("p1", "q", "m1");
    let k2 = CacheKey::new("p2", "q", "m1");
    store.store(&k1, &completion("a1")).await.unwrap();
    store.store(&k2, &completion("a2")).await.unwrap();

    store.purge("p1").await.unwrap();
    assert!(store.lookup(&k1).await.unwrap().is_none());
    assert!(store.lookup(&k2).await.unwrap().is_some());
}

#[tokio::test]
async fn project_upsert_updates_fields() {
    let store = SqliteStore::in_memory().unwrap();
    let v1 = ProjectSnapshot {
        name: "Apollo".into(),
        description: "Lunar program".into(),
        status: "active".into(),
    };
    store.put("p1", &v1).await.unwrap();

    let v2 = ProjectSnapshot {
        status: "archived".into(),
        ..v1.clone()
    };
    store.put("p1", &v2).await.unwrap();
    assert_eq!(store.get("p1").await.unwrap().unwrap().status, "archived");
}

#[tokio::test]
async fn survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("narwhal.db");

    {
        let store = SqliteStore::open(&path).unwrap();
        store.append("p1", Turn::user("persisted")).await.unwrap();
        let key = CacheKey::new("p1", "q", "m1");
        store.store(&key, &completion("cached")).await.unwrap();
    }

    let store = SqliteStore::open(&path).unwrap();
    assert_eq!(store.list("p1").await.unwrap()[0].content, "persisted");
    let key = CacheKey::new("p1", "q", "m1");
    assert_eq!(store.lookup(&key).await.unwrap().unwrap().reply, "cached");
}
