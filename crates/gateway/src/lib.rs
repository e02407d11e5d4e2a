//! Narwhal gateway — turns a user's chat message plus project context
//! into a completion request, with a durable conversation history and a
//! two-tier response cache in front of the upstream call.
//!
//! The public surface is [`Gateway`]: `send_message`, `clear_history`,
//! and `get_history`. Everything the gateway touches — credential,
//! history, model registry, project metadata, durable cache — comes in
//! through the [`Backend`] bundle, owned by the composition root rather
//! than by process-wide singletons.

pub use backend::{Backend, MemoryBackend, SqliteBackend, StorageBackend};
pub use cache::{DEFAULT_CACHE_CAPACITY, ResponseCache};
pub use config::{
    CacheConfig, GatewayConfig, GenerationParams, LlmConfig, ProjectConfig, StorageConfig,
    StorageKind,
};
pub use context::{HISTORY_WINDOW, RequestContext, aggregate};
pub use error::GatewayError;
pub use gateway::Gateway;
pub use utils::expand_env_vars;

mod backend;
mod cache;
mod config;
mod context;
mod error;
mod gateway;
mod utils;
