//! Provider abstraction for the unified completion interface.

use crate::{Request, Response};
use anyhow::Result;

/// A chat-completion provider.
///
/// Implementations issue a single non-streaming completion call and do
/// nothing else: no caching, no persistence. The credential is passed
/// per call because it is resolved at request time, not at construction.
pub trait Complete: Send + Sync {
    /// Send an assembled request to the completion endpoint.
    fn complete(
        &self,
        credential: &str,
        request: &Request,
    ) -> impl Future<Output = Result<Response>> + Send;
}
