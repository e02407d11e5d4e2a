//! Storage traits and backends for the Narwhal gateway.
//!
//! The gateway core talks to its external collaborators through the
//! narrow traits defined here: credential lookup, the append-only
//! conversation history, the active-model registry, project metadata,
//! and the durable completion cache tier. Two implementations ship with
//! the crate: [`MemoryStore`] (process-local, used in tests and for
//! ephemeral deployments) and [`SqliteStore`] (durable, SQL files under
//! `sql/` loaded via `include_str!`).

pub use memory::{ActiveModel, MemoryStore, StaticCredentials};
pub use sqlite::SqliteStore;
pub use types::{
    CacheKey, Completion, Credential, DEFAULT_MODEL, ModelConfig, ProjectSnapshot, Turn, now_unix,
};

mod memory;
mod sqlite;
mod types;

use anyhow::Result;

/// Read-only access to the single upstream API credential.
pub trait CredentialStore: Send + Sync {
    /// The configured credential, or `None` when unset.
    fn get(&self) -> impl Future<Output = Result<Option<Credential>>> + Send;
}

/// Append-only per-conversation message log.
pub trait HistoryStore: Send + Sync {
    /// Append one turn to a conversation.
    fn append(&self, conversation: &str, turn: Turn) -> impl Future<Output = Result<()>> + Send;

    /// All turns of a conversation, in chronological order.
    fn list(&self, conversation: &str) -> impl Future<Output = Result<Vec<Turn>>> + Send;

    /// Delete every turn of a conversation.
    fn clear(&self, conversation: &str) -> impl Future<Output = Result<()>> + Send;
}

/// The currently active model; may change at runtime.
pub trait ModelRegistry: Send + Sync {
    /// The active model configuration.
    fn active(&self) -> impl Future<Output = Result<ModelConfig>> + Send;
}

/// Read-only project metadata, keyed by project id.
pub trait ProjectStore: Send + Sync {
    /// The project snapshot, or `None` when the project is unknown.
    fn get(&self, id: &str) -> impl Future<Output = Result<Option<ProjectSnapshot>>> + Send;

    /// Upsert a project snapshot (used by the composition root to seed).
    fn put(
        &self,
        id: &str,
        snapshot: &ProjectSnapshot,
    ) -> impl Future<Output = Result<()>> + Send;
}

/// The durable completion-cache tier, keyed by the cache triple.
pub trait CompletionStore: Send + Sync {
    /// Look up a cached completion.
    fn lookup(&self, key: &CacheKey) -> impl Future<Output = Result<Option<Completion>>> + Send;

    /// Store a completion under its key (insert or replace).
    fn store(
        &self,
        key: &CacheKey,
        completion: &Completion,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Remove every entry scoped to a conversation.
    fn purge(&self, conversation: &str) -> impl Future<Output = Result<()>> + Send;
}
