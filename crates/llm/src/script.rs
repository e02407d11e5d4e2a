//! Scripted provider for tests and offline use.

use crate::{Choice, Complete, FinishReason, Request, Response, ResponseMessage, Role};
use anyhow::Result;
use std::{
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::{Duration, SystemTime, UNIX_EPOCH},
};

/// A provider that returns a canned reply and counts its calls.
///
/// Clones share the call counter, so a test can hand one clone to the
/// gateway and keep another to assert how often upstream was invoked.
#[derive(Clone)]
pub struct ScriptedProvider {
    reply: Arc<str>,
    delay: Duration,
    calls: Arc<AtomicUsize>,
}

impl ScriptedProvider {
    /// Create a provider that always replies with `reply`.
    pub fn new(reply: impl Into<Arc<str>>) -> Self {
        Self {
            reply: reply.into(),
            delay: Duration::ZERO,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Delay each call, to let tests force overlapping requests.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// How many times `complete` has been called.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Complete for ScriptedProvider {
    async fn complete(&self, _credential: &str, request: &Request) -> Result<Response> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let created = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();

        Ok(Response {
            id: ulid::Ulid::new().to_string(),
            created,
            model: request.model.to_string(),
            choices: vec![Choice {
                index: 0,
                message: ResponseMessage {
                    role: Some(Role::Assistant),
                    content: Some(self.reply.to_string()),
                },
                finish_reason: Some(FinishReason::Stop),
            }],
            usage: None,
        })
    }
}
