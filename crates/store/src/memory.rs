//! In-memory backends.
//!
//! Process-local implementations of every storage trait. Useful for
//! tests and for ephemeral deployments that do not need durability.

use crate::{
    CacheKey, Completion, CompletionStore, Credential, CredentialStore, HistoryStore, ModelConfig,
    ModelRegistry, ProjectSnapshot, ProjectStore, Turn,
};
use anyhow::Result;
use compact_str::CompactString;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;

/// In-memory history, project, and completion store.
#[derive(Default)]
pub struct MemoryStore {
    turns: Mutex<HashMap<CompactString, Vec<Turn>>>,
    projects: Mutex<HashMap<CompactString, ProjectSnapshot>>,
    completions: Mutex<HashMap<CacheKey, Completion>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl HistoryStore for MemoryStore {
    async fn append(&self, conversation: &str, turn: Turn) -> Result<()> {
        self.turns
            .lock()
            .entry(conversation.into())
            .or_default()
            .push(turn);
        Ok(())
    }

    async fn list(&self, conversation: &str) -> Result<Vec<Turn>> {
        Ok(self
            .turns
            .lock()
            .get(conversation)
            .cloned()
            .unwrap_or_default())
    }

    async fn clear(&self, conversation: &str) -> Result<()> {
        self.turns.lock().remove(conversation);
        Ok(())
    }
}

impl ProjectStore for MemoryStore {
    async fn get(&self, id: &str) -> Result<Option<ProjectSnapshot>> {
        Ok(self.projects.lock().get(id).cloned())
    }

    async fn put(&self, id: &str, snapshot: &ProjectSnapshot) -> Result<()> {
        self.projects.lock().insert(id.into(), snapshot.clone());
        Ok(())
    }
}

impl CompletionStore for MemoryStore {
    async fn lookup(&self, key: &CacheKey) -> Result<Option<Completion>> {
        Ok(self.completions.lock().get(key).cloned())
    }

    async fn store(&self, key: &CacheKey, completion: &Completion) -> Result<()> {
        self.completions
            .lock()
            .insert(key.clone(), completion.clone());
        Ok(())
    }

    async fn purge(&self, conversation: &str) -> Result<()> {
        self.completions
            .lock()
            .retain(|key, _| key.conversation != conversation);
        Ok(())
    }
}

/// A credential store holding a fixed, optional credential.
#[derive(Debug, Clone, Default)]
pub struct StaticCredentials(Option<Credential>);

impl StaticCredentials {
    /// A store with a configured credential. Blank values count as unset.
    pub fn new(value: impl AsRef<str>) -> Self {
        let value = value.as_ref().trim();
        if value.is_empty() {
            Self(None)
        } else {
            Self(Some(Credential::new(value)))
        }
    }

    /// A store with no credential configured.
    pub fn empty() -> Self {
        Self(None)
    }
}

impl CredentialStore for StaticCredentials {
    async fn get(&self) -> Result<Option<Credential>> {
        Ok(self.0.clone())
    }
}

/// A model registry holding the active model, swappable at runtime.
#[derive(Debug, Default)]
pub struct ActiveModel {
    model: RwLock<ModelConfig>,
}

impl ActiveModel {
    /// Create a registry with the given active model.
    pub fn new(model: ModelConfig) -> Self {
        Self {
            model: RwLock::new(model),
        }
    }

    /// Swap the active model.
    pub fn set(&self, model: ModelConfig) {
        *self.model.write() = model;
    }
}

impl ModelRegistry for ActiveModel {
    async fn active(&self) -> Result<ModelConfig> {
        Ok(self.model.read().clone())
    }
}
