//! Backend bundle: the external collaborators behind one set of
//! associated types, so the gateway is wired by explicit dependency
//! injection instead of implicit singletons.

use store::{
    ActiveModel, CompletionStore, CredentialStore, HistoryStore, MemoryStore, ModelRegistry,
    ProjectStore, SqliteStore, StaticCredentials,
};

/// The collaborators a [`Gateway`](crate::Gateway) runs against.
///
/// `Storage` covers the three stores that usually live in the same
/// database: history, project metadata, and the durable cache tier.
pub trait Backend: Send + Sync {
    /// Credential lookup.
    type Credentials: CredentialStore;
    /// Active-model registry.
    type Models: ModelRegistry;
    /// History, project, and durable completion storage.
    type Storage: HistoryStore + ProjectStore + CompletionStore;

    /// The credential store.
    fn credentials(&self) -> &Self::Credentials;
    /// The model registry.
    fn models(&self) -> &Self::Models;
    /// The storage backend.
    fn storage(&self) -> &Self::Storage;
}

/// A backend with static credentials, a runtime-swappable model
/// registry, and a pluggable storage implementation.
pub struct StorageBackend<S> {
    credentials: StaticCredentials,
    models: ActiveModel,
    storage: S,
}

impl<S> StorageBackend<S> {
    /// Bundle the collaborators.
    pub fn new(credentials: StaticCredentials, models: ActiveModel, storage: S) -> Self {
        Self {
            credentials,
            models,
            storage,
        }
    }
}

impl<S> Backend for StorageBackend<S>
where
    S: HistoryStore + ProjectStore + CompletionStore,
{
    type Credentials = StaticCredentials;
    type Models = ActiveModel;
    type Storage = S;

    fn credentials(&self) -> &Self::Credentials {
        &self.credentials
    }

    fn models(&self) -> &Self::Models {
        &self.models
    }

    fn storage(&self) -> &Self::Storage {
        &self.storage
    }
}

/// Backend over process-local storage (no durability).
pub type MemoryBackend = StorageBackend<MemoryStore>;

/// Backend over a SQLite database.
pub type SqliteBackend = StorageBackend<SqliteStore>;
