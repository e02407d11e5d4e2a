//! Orchestrator tests: cache behavior, history writes, error surface,
//! and concurrent-duplicate collapsing.

use anyhow::Result;
use llm::{
    Choice, Complete, FinishReason, Request, Response, ResponseMessage, Role, ScriptedProvider,
    UpstreamErrorKind,
};
use narwhal_gateway::{
    Backend, Gateway, GatewayError, GenerationParams, MemoryBackend, StorageBackend,
};
use std::{
    sync::{Arc, Mutex},
    time::Duration,
};
use store::{
    ActiveModel, CacheKey, Completion, CompletionStore, HistoryStore, MemoryStore, ModelConfig,
    ProjectSnapshot, ProjectStore, SqliteStore, StaticCredentials, Turn, now_unix,
};

fn snapshot(name: &str) -> ProjectSnapshot {
    ProjectSnapshot {
        name: name.into(),
        description: "A test project".into(),
        status: "active".into(),
    }
}

async fn backend_with_project(id: &str) -> MemoryBackend {
    let backend = StorageBackend::new(
        StaticCredentials::new("sk-test"),
        ActiveModel::new(ModelConfig::new("m1")),
        MemoryStore::new(),
    );
    backend.storage().put(id, &snapshot("Apollo")).await.unwrap();
    backend
}

fn canned(reply: &str) -> Response {
    Response {
        id: "chatcmpl-1".into(),
        created: now_unix(),
        model: "m1".into(),
        choices: vec![Choice {
            index: 0,
            message: ResponseMessage {
                role: Some(Role::Assistant),
                content: Some(reply.into()),
            },
            finish_reason: Some(FinishReason::Stop),
        }],
        usage: None,
    }
}

/// Records the last request and replies with a fixed completion.
#[derive(Clone, Default)]
struct RecordingProvider {
    last: Arc<Mutex<Option<Request>>>,
}

impl Complete for RecordingProvider {
    async fn complete(&self, _credential: &str, request: &Request) -> Result<Response> {
        *self.last.lock().unwrap() = Some(request.clone());
        Ok(canned("Recorded reply."))
    }
}

/// Always fails with a fixed raw error message.
struct FailingProvider(&'static str);

impl Complete for FailingProvider {
    async fn complete(&self, _credential: &str, _request: &Request) -> Result<Response> {
        anyhow::bail!("{}", self.0)
    }
}

#[tokio::test]
async fn miss_calls_upstream_and_persists_both_turns() {
    let backend = backend_with_project("p1").await;
    let provider = ScriptedProvider::new("Hello there.");
    let gateway = Gateway::new(backend, provider.clone(), GenerationParams::default());

    let completion = gateway.send_message("p1", "hi").await.unwrap();
    assert_eq!(completion.reply, "Hello there.");
    assert_eq!(provider.calls(), 1);

    let history = gateway.get_history("p1").await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].role, Role::User);
    assert_eq!(history[0].content, "hi");
    assert_eq!(history[1].role, Role::Assistant);
    assert_eq!(history[1].content, "Hello there.");
}

#[tokio::test]
async fn repeated_identical_message_is_served_from_cache() {
    let backend = backend_with_project("p1").await;
    let provider = ScriptedProvider::new("Once.");
    let gateway = Gateway::new(backend, provider.clone(), GenerationParams::default());

    let first = gateway.send_message("p1", "same question").await.unwrap();
    let second = gateway.send_message("p1", "same question").await.unwrap();
    assert_eq!(first, second);
    assert_eq!(provider.calls(), 1);

    // A cache hit does not re-log the exchange.
    assert_eq!(gateway.get_history("p1").await.unwrap().len(), 2);
}

#[tokio::test]
async fn durable_hit_skips_upstream_and_promotes() {
    let backend = backend_with_project("p1").await;
    let key = CacheKey::new("p1", "What's next?", "m1");
    let cached = Completion {
        id: "seeded".into(),
        created: now_unix(),
        reply: "Already answered.".into(),
        finish_reason: FinishReason::Stop,
    };
    backend.storage().store(&key, &cached).await.unwrap();

    let provider = ScriptedProvider::new("should never run");
    let gateway = Gateway::new(backend, provider.clone(), GenerationParams::default());

    let completion = gateway.send_message("p1", "What's next?").await.unwrap();
    assert_eq!(completion.reply, "Already answered.");
    assert_eq!(provider.calls(), 0);
    assert!(gateway.cache().contains_volatile(&key));
}

#[tokio::test]
async fn missing_credential_short_circuits() {
    let backend = StorageBackend::new(
        StaticCredentials::empty(),
        ActiveModel::new(ModelConfig::new("m1")),
        MemoryStore::new(),
    );
    backend.storage().put("p1", &snapshot("Apollo")).await.unwrap();

    let provider = ScriptedProvider::new("unreached");
    let gateway = Gateway::new(backend, provider.clone(), GenerationParams::default());

    let error = gateway.send_message("p1", "hi").await.unwrap_err();
    assert_eq!(error, GatewayError::MissingCredential);
    assert_eq!(provider.calls(), 0);
}

#[tokio::test]
async fn unknown_project_fails_before_upstream() {
    let backend = StorageBackend::new(
        StaticCredentials::new("sk-test"),
        ActiveModel::new(ModelConfig::new("m1")),
        MemoryStore::new(),
    );
    let provider = ScriptedProvider::new("unreached");
    let gateway = Gateway::new(backend, provider.clone(), GenerationParams::default());

    let error = gateway.send_message("ghost", "hi").await.unwrap_err();
    assert_eq!(error, GatewayError::ProjectNotFound("ghost".into()));
    assert_eq!(provider.calls(), 0);
}

#[tokio::test]
async fn upstream_failure_is_classified() {
    let backend = backend_with_project("p1").await;
    let provider = FailingProvider("completion endpoint returned 429 Too Many Requests: {}");
    let gateway = Gateway::new(backend, provider, GenerationParams::default());

    let error = gateway.send_message("p1", "hi").await.unwrap_err();
    let GatewayError::Upstream(upstream) = error else {
        panic!("expected an upstream error, got {error:?}");
    };
    assert_eq!(upstream.kind, UpstreamErrorKind::RateLimited);

    // Failed calls leave no trace in history.
    assert!(gateway.get_history("p1").await.unwrap().is_empty());
}

#[tokio::test]
async fn window_carries_the_last_ten_turns() {
    let backend = backend_with_project("proj-42").await;
    for i in 1..=12 {
        let turn = if i % 2 == 1 {
            Turn::user(format!("turn-{i}"))
        } else {
            Turn::assistant(format!("turn-{i}"))
        };
        backend.storage().append("proj-42", turn).await.unwrap();
    }

    let provider = RecordingProvider::default();
    let gateway = Gateway::new(backend, provider.clone(), GenerationParams::default());
    gateway.send_message("proj-42", "What's next?").await.unwrap();

    let request = provider.last.lock().unwrap().clone().unwrap();
    assert_eq!(request.model, "m1");
    // 1 system + 10 window + 1 user.
    assert_eq!(request.messages.len(), 12);
    assert_eq!(request.messages[0].role, Role::System);
    assert!(request.messages[0].content.contains("Apollo"));
    assert_eq!(request.messages[1].content, "turn-3");
    assert_eq!(request.messages[10].content, "turn-12");
    assert_eq!(request.messages[11].role, Role::User);
    assert_eq!(request.messages[11].content, "What's next?");

    // The exchange was persisted after the 12 pre-existing turns.
    let history = gateway.get_history("proj-42").await.unwrap();
    assert_eq!(history.len(), 14);
    assert_eq!(history[13].content, "Recorded reply.");

    // Both cache tiers hold the answer under the triple.
    let key = CacheKey::new("proj-42", "What's next?", "m1");
    assert!(gateway.cache().contains_volatile(&key));
    let durable = gateway.backend().storage().lookup(&key).await.unwrap();
    assert_eq!(durable.unwrap().reply, "Recorded reply.");
}

#[tokio::test]
async fn clear_history_is_scoped() {
    let backend = backend_with_project("p1").await;
    backend.storage().put("p2", &snapshot("Borealis")).await.unwrap();

    let provider = ScriptedProvider::new("reply");
    let gateway = Gateway::new(backend, provider.clone(), GenerationParams::default());
    gateway.send_message("p1", "q").await.unwrap();
    gateway.send_message("p2", "q").await.unwrap();
    assert_eq!(provider.calls(), 2);

    gateway.clear_history("p1").await.unwrap();

    assert!(gateway.get_history("p1").await.unwrap().is_empty());
    assert_eq!(gateway.get_history("p2").await.unwrap().len(), 2);
    assert!(!gateway.cache().contains_volatile(&CacheKey::new("p1", "q", "m1")));
    assert!(gateway.cache().contains_volatile(&CacheKey::new("p2", "q", "m1")));

    // The cleared conversation misses the cache and calls upstream again.
    gateway.send_message("p1", "q").await.unwrap();
    assert_eq!(provider.calls(), 3);
    gateway.send_message("p2", "q").await.unwrap();
    assert_eq!(provider.calls(), 3);
}

#[tokio::test]
async fn concurrent_duplicates_collapse_to_one_upstream_call() {
    let backend = backend_with_project("p1").await;
    let provider = ScriptedProvider::new("joined").with_delay(Duration::from_millis(50));
    let gateway = Gateway::new(backend, provider.clone(), GenerationParams::default());

    let (a, b) = tokio::join!(
        gateway.send_message("p1", "race"),
        gateway.send_message("p1", "race"),
    );
    assert_eq!(a.unwrap(), b.unwrap());
    assert_eq!(provider.calls(), 1);
    assert_eq!(gateway.get_history("p1").await.unwrap().len(), 2);
}

#[tokio::test]
async fn durable_cache_survives_a_gateway_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("narwhal.db");

    let open_backend = || {
        StorageBackend::new(
            StaticCredentials::new("sk-test"),
            ActiveModel::new(ModelConfig::new("m1")),
            SqliteStore::open(&path).unwrap(),
        )
    };

    let backend = open_backend();
    backend.storage().put("p1", &snapshot("Apollo")).await.unwrap();
    let provider = ScriptedProvider::new("durable answer");
    let gateway = Gateway::new(backend, provider.clone(), GenerationParams::default());
    gateway.send_message("p1", "q").await.unwrap();
    assert_eq!(provider.calls(), 1);
    drop(gateway);

    // A fresh gateway over the same database answers from the durable
    // tier without calling upstream.
    let gateway = Gateway::new(open_backend(), provider.clone(), GenerationParams::default());
    let completion = gateway.send_message("p1", "q").await.unwrap();
    assert_eq!(completion.reply, "durable answer");
    assert_eq!(provider.calls(), 1);
    assert_eq!(gateway.get_history("p1").await.unwrap().len(), 2);
}

/// Storage whose durable cache writes always fail; history and project
/// reads delegate to the wrapped store.
struct FlakyStorage(MemoryStore);

impl HistoryStore for FlakyStorage {
    async fn append(&self, conversation: &str, turn: Turn) -> Result<()> {
        self.0.append(conversation, turn).await
    }

    async fn list(&self, conversation: &str) -> Result<Vec<Turn>> {
        self.0.list(conversation).await
    }

    async fn clear(&self, conversation: &str) -> Result<()> {
        self.0.clear(conversation).await
    }
}

impl ProjectStore for FlakyStorage {
    async fn get(&self, id: &str) -> Result<Option<ProjectSnapshot>> {
        self.0.get(id).await
    }

    async fn put(&self, id: &str, snapshot: &ProjectSnapshot) -> Result<()> {
        self.0.put(id, snapshot).await
    }
}

impl CompletionStore for FlakyStorage {
    async fn lookup(&self, key: &CacheKey) -> Result<Option<Completion>> {
        self.0.lookup(key).await
    }

    async fn store(&self, _key: &CacheKey, _completion: &Completion) -> Result<()> {
        anyhow::bail!("durable cache tier unavailable")
    }

    async fn purge(&self, conversation: &str) -> Result<()> {
        self.0.purge(conversation).await
    }
}

#[tokio::test]
async fn durable_write_failure_does_not_fail_the_call() {
    let backend = StorageBackend::new(
        StaticCredentials::new("sk-test"),
        ActiveModel::new(ModelConfig::new("m1")),
        FlakyStorage(MemoryStore::new()),
    );
    backend.storage().put("p1", &snapshot("Apollo")).await.unwrap();

    let provider = ScriptedProvider::new("still delivered");
    let gateway = Gateway::new(backend, provider.clone(), GenerationParams::default());

    let completion = gateway.send_message("p1", "q").await.unwrap();
    assert_eq!(completion.reply, "still delivered");

    // The volatile tier took the write, so a repeat is still a hit.
    assert!(gateway.cache().contains_volatile(&CacheKey::new("p1", "q", "m1")));
    gateway.send_message("p1", "q").await.unwrap();
    assert_eq!(provider.calls(), 1);
}
