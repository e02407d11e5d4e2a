//! Domain types shared by the storage traits and the gateway.

use compact_str::CompactString;
use llm::{FinishReason, Response, Role};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// One turn of a conversation. Immutable once persisted: the history
/// store only ever appends turns or bulk-deletes them on clear.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    /// Who produced the turn.
    pub role: Role,
    /// The text of the turn.
    pub content: String,
    /// Creation timestamp (unix seconds).
    pub created_at: u64,
}

impl Turn {
    /// Create a turn with the current timestamp.
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            created_at: now_unix(),
        }
    }

    /// Create a user turn.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Create an assistant turn.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// A completed assistant reply, as cached and as returned to callers.
///
/// A cached value and a freshly produced one have the identical shape;
/// cache origin is only observable through latency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    /// Provider completion id, or a generated ulid when absent.
    pub id: String,
    /// Creation timestamp (unix seconds).
    pub created: u64,
    /// The reply text (first produced choice).
    pub reply: String,
    /// Why the model stopped generating.
    pub finish_reason: FinishReason,
}

impl Completion {
    /// Extract a completion from an upstream response.
    ///
    /// Returns `None` when the response carries no choices with text.
    pub fn from_response(response: Response) -> Option<Self> {
        let reply = response.content()?.to_owned();
        let finish_reason = response.reason().unwrap_or_default();
        let id = if response.id.is_empty() {
            ulid::Ulid::new().to_string()
        } else {
            response.id
        };
        let created = if response.created == 0 {
            now_unix()
        } else {
            response.created
        };
        Some(Self {
            id,
            created,
            reply,
            finish_reason,
        })
    }
}

/// The deterministic cache key: conversation id, normalized user text,
/// and model id. Identical triples always produce identical keys; the
/// key is used verbatim in both cache tiers.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    /// The conversation the question belongs to.
    pub conversation: CompactString,
    /// The user text, trimmed of surrounding whitespace.
    pub text: String,
    /// The model the question was (or would be) answered with.
    pub model: CompactString,
}

impl CacheKey {
    /// Build a key, normalizing the user text.
    pub fn new(
        conversation: impl Into<CompactString>,
        text: &str,
        model: impl Into<CompactString>,
    ) -> Self {
        Self {
            conversation: conversation.into(),
            text: text.trim().to_owned(),
            model: model.into(),
        }
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}: {:.40}", self.conversation, self.model, self.text)
    }
}

/// Identifier for the model to run completions against.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// The active model configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Model identifier passed to the provider.
    pub id: CompactString,
}

impl ModelConfig {
    /// Create a model configuration.
    pub fn new(id: impl Into<CompactString>) -> Self {
        Self { id: id.into() }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self::new(DEFAULT_MODEL)
    }
}

/// Read-only snapshot of the owning project's descriptive fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectSnapshot {
    /// Project name.
    pub name: String,
    /// Project description.
    pub description: String,
    /// Current project status (free-form, e.g. "active").
    pub status: String,
}

/// An upstream API credential. `Debug` redacts the value.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Wrap a credential value.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The raw credential value.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Credential(***)")
    }
}

/// Return the current unix timestamp in seconds.
pub fn now_unix() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
