//! Gateway configuration loaded from TOML.

use crate::{DEFAULT_CACHE_CAPACITY, utils::expand_env_vars};
use anyhow::{Context, Result};
use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use std::path::Path;
use store::{DEFAULT_MODEL, ProjectSnapshot};

/// Top-level gateway configuration.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Upstream provider configuration.
    pub llm: LlmConfig,
    /// Storage backend configuration.
    pub storage: StorageConfig,
    /// Volatile-cache configuration.
    pub cache: CacheConfig,
    /// The owning project, seeded into the project store at startup.
    pub project: ProjectConfig,
}

impl GatewayConfig {
    /// Parse a TOML string, expanding `${ENV_VAR}` patterns first.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let expanded = expand_env_vars(toml_str);
        toml::from_str(&expanded).context("invalid gateway configuration")
    }

    /// Load configuration from a file path.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_toml(&content)
    }
}

/// Upstream provider configuration.
#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Model identifier.
    pub model: CompactString,
    /// API key (supports `${ENV_VAR}` expansion).
    pub api_key: String,
    /// Optional base URL override for the completion endpoint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Sampling temperature, passed through to the provider.
    pub temperature: f32,
    /// Output-length cap, passed through to the provider.
    pub max_tokens: usize,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.into(),
            api_key: "${OPENAI_API_KEY}".to_owned(),
            base_url: None,
            temperature: 0.7,
            max_tokens: 1024,
        }
    }
}

/// Fixed generation parameters carried into every upstream request.
#[derive(Debug, Clone, Copy)]
pub struct GenerationParams {
    /// Sampling temperature.
    pub temperature: f32,
    /// Output-length cap in tokens.
    pub max_tokens: usize,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_tokens: 1024,
        }
    }
}

impl From<&LlmConfig> for GenerationParams {
    fn from(config: &LlmConfig) -> Self {
        Self {
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }
}

/// Storage backend configuration.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Backend kind.
    pub backend: StorageKind,
    /// SQLite database path (sqlite backend only).
    pub path: Option<String>,
}

/// Storage backend kind.
#[derive(Debug, Default, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StorageKind {
    /// Process-local storage, no durability.
    #[default]
    InMemory,
    /// SQLite-backed durable storage.
    Sqlite,
}

/// Volatile-cache configuration.
#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum number of entries in the in-process tier.
    pub capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CACHE_CAPACITY,
        }
    }
}

/// The owning project's identity and descriptive fields.
#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    /// Project id; also the conversation id the binary chats under.
    pub id: CompactString,
    /// Project name.
    pub name: String,
    /// Project description.
    pub description: String,
    /// Project status.
    pub status: String,
}

impl ProjectConfig {
    /// The snapshot seeded into the project store.
    pub fn snapshot(&self) -> ProjectSnapshot {
        ProjectSnapshot {
            name: self.name.clone(),
            description: self.description.clone(),
            status: self.status.clone(),
        }
    }
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            id: "default".into(),
            name: "Untitled project".to_owned(),
            description: String::new(),
            status: "active".to_owned(),
        }
    }
}
