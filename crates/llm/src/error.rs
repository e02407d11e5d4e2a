//! Upstream failure classification.
//!
//! Maps raw provider failures to one of four recognized user-facing
//! causes, checked in a fixed precedence order, with a generic
//! "unreachable" fallback. The matching deliberately sniffs status
//! codes and message text out of the raw error; keeping it behind the
//! single [`classify`] function means the rules can change without
//! touching the orchestrator.

use thiserror::Error;

/// The recognized causes of an upstream failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UpstreamErrorKind {
    /// The configured credential was rejected.
    AuthFailed,
    /// The request itself was rejected (bad model selection or payload).
    BadRequest,
    /// The provider's rate limit or quota was exceeded.
    RateLimited,
    /// The transport timed out or could not connect.
    Timeout,
    /// Anything else; carries the original message.
    Unreachable,
}

/// A classified upstream failure.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct UpstreamError {
    /// The classified cause.
    pub kind: UpstreamErrorKind,
    /// Human-readable message surfaced to the caller.
    pub message: String,
}

impl UpstreamError {
    /// Create an error of the given kind with its message.
    pub fn new(kind: UpstreamErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Classify a raw upstream failure into a user-facing cause.
///
/// Precedence: authentication, then malformed request, then rate limit,
/// then transport timeout. Unmatched failures fall through to
/// [`UpstreamErrorKind::Unreachable`] carrying the original message.
pub fn classify(error: &anyhow::Error) -> UpstreamError {
    let raw = format!("{error:#}");
    let lower = raw.to_lowercase();

    if contains_any(&lower, &["401", "403", "unauthorized", "invalid api key", "authentication"]) {
        return UpstreamError::new(
            UpstreamErrorKind::AuthFailed,
            "the configured API credential was rejected by the model provider",
        );
    }

    if contains_any(&lower, &["400", "404", "422", "invalid model", "does not exist", "invalid request"]) {
        return UpstreamError::new(
            UpstreamErrorKind::BadRequest,
            "the model provider rejected the request; check the selected model",
        );
    }

    if contains_any(&lower, &["429", "rate limit", "quota"]) {
        return UpstreamError::new(
            UpstreamErrorKind::RateLimited,
            "the model provider rate limit was exceeded; try again later",
        );
    }

    let transport_timeout = error
        .downcast_ref::<reqwest::Error>()
        .is_some_and(|e| e.is_timeout() || e.is_connect());
    if transport_timeout || contains_any(&lower, &["timed out", "timeout", "connection"]) {
        return UpstreamError::new(
            UpstreamErrorKind::Timeout,
            "the model provider did not respond in time",
        );
    }

    UpstreamError::new(
        UpstreamErrorKind::Unreachable,
        format!("the model service is unreachable: {raw}"),
    )
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| haystack.contains(needle))
}
