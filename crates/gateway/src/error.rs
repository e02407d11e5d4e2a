//! The typed error surface of `send_message`.

use compact_str::CompactString;
use llm::UpstreamError;
use thiserror::Error;

/// Why a `send_message` call failed.
///
/// Configuration and not-found errors abort before any network call;
/// upstream errors are classified before surfacing. Persistence
/// failures after a successful upstream call never appear here — they
/// are logged and swallowed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GatewayError {
    /// No upstream credential is configured. Fatal, not retried.
    #[error(
        "no upstream API credential is configured; set `llm.api_key` in gateway.toml \
         or the environment variable it expands"
    )]
    MissingCredential,

    /// The owning project could not be resolved. Fatal per call.
    #[error("project `{0}` was not found")]
    ProjectNotFound(CompactString),

    /// The upstream call failed; already classified into a user-facing
    /// cause.
    #[error(transparent)]
    Upstream(#[from] UpstreamError),
}
