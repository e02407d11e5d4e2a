//! The gateway orchestrator.
//!
//! `send_message` runs the whole pipeline: aggregate context, check the
//! cache, call upstream on a miss, persist both turns, write through
//! both cache tiers, return the completion. Concurrent identical
//! requests are collapsed by a per-key in-flight gate.

use crate::{
    Backend, GatewayError, GenerationParams, RequestContext, ResponseCache, aggregate,
};
use anyhow::Result;
use llm::{Complete, UpstreamError, UpstreamErrorKind, classify};
use parking_lot::Mutex;
use std::{collections::HashMap, sync::Arc};
use store::{CacheKey, Completion, HistoryStore, Turn};

/// The conversational-assistant gateway.
///
/// Owns the volatile cache tier and the in-flight table; everything
/// else is reached through the injected [`Backend`] and provider.
pub struct Gateway<B: Backend, P: Complete> {
    backend: B,
    provider: P,
    cache: ResponseCache,
    inflight: Mutex<HashMap<CacheKey, Arc<tokio::sync::Mutex<()>>>>,
    params: GenerationParams,
}

impl<B: Backend, P: Complete> Gateway<B, P> {
    /// Create a gateway with the default volatile-cache capacity.
    pub fn new(backend: B, provider: P, params: GenerationParams) -> Self {
        Self {
            backend,
            provider,
            cache: ResponseCache::default(),
            inflight: Mutex::new(HashMap::new()),
            params,
        }
    }

    /// Override the volatile-cache capacity.
    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache = ResponseCache::new(capacity);
        self
    }

    /// The injected backend (the composition root uses this to seed
    /// project metadata).
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// The response cache. Test hook.
    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    /// Answer a user message in the given conversation.
    ///
    /// Returns a cached completion when this exact question was already
    /// answered for this conversation and model; otherwise calls
    /// upstream, appends the user and assistant turns to history, and
    /// fills both cache tiers. Cache hits skip the history write — the
    /// exchange is already logged.
    pub async fn send_message(
        &self,
        conversation: &str,
        text: &str,
    ) -> Result<Completion, GatewayError> {
        let context = aggregate(&self.backend, conversation).await?;
        let key = CacheKey::new(conversation, text, context.model.id.clone());

        if let Some(hit) = self.cache.lookup(self.backend.storage(), &key).await {
            tracing::debug!("cache hit for {key}");
            return Ok(hit);
        }

        // Collapse concurrent identical requests into one upstream call:
        // the first caller dispatches, followers wait on the gate and
        // then find the cache filled.
        let gate = self.gate(&key);
        let guard = gate.lock().await;
        let result = self.dispatch(&context, &key, text).await;
        drop(guard);
        self.inflight.lock().remove(&key);
        result
    }

    /// Clear a conversation's history and purge its cached completions
    /// from both tiers. Other conversations are untouched.
    pub async fn clear_history(&self, conversation: &str) -> Result<()> {
        self.backend.storage().clear(conversation).await?;
        self.cache.purge(self.backend.storage(), conversation).await?;
        tracing::info!("cleared history and cached completions for {conversation}");
        Ok(())
    }

    /// The full history of a conversation, oldest first. Unbounded —
    /// distinct from the window carried into upstream requests.
    pub async fn get_history(&self, conversation: &str) -> Result<Vec<Turn>> {
        self.backend.storage().list(conversation).await
    }

    /// The cache-miss path, run under the in-flight gate.
    async fn dispatch(
        &self,
        context: &RequestContext,
        key: &CacheKey,
        text: &str,
    ) -> Result<Completion, GatewayError> {
        // A concurrent duplicate may have filled the cache while we
        // waited on the gate.
        if let Some(hit) = self.cache.lookup(self.backend.storage(), key).await {
            tracing::debug!("cache filled while waiting in flight for {key}");
            return Ok(hit);
        }

        let request = context.request(text, &self.params);
        let response = match self
            .provider
            .complete(context.credential.as_str(), &request)
            .await
        {
            Ok(response) => response,
            Err(error) => {
                let classified = classify(&error);
                tracing::warn!("upstream call failed ({:?}): {error:#}", classified.kind);
                return Err(classified.into());
            }
        };

        let Some(completion) = Completion::from_response(response) else {
            return Err(UpstreamError::new(
                UpstreamErrorKind::Unreachable,
                "the model provider returned no choices",
            )
            .into());
        };

        // The user already has their answer from here on: persistence
        // failures are logged, never surfaced. User turn first, so an
        // interruption in between leaves a replayable prefix.
        let storage = self.backend.storage();
        let conversation = key.conversation.as_str();
        if let Err(error) = storage.append(conversation, Turn::user(text)).await {
            tracing::warn!("failed to persist user turn for {conversation}: {error:#}");
        }
        if let Err(error) = storage
            .append(conversation, Turn::assistant(completion.reply.clone()))
            .await
        {
            tracing::warn!("failed to persist assistant turn for {conversation}: {error:#}");
        }

        self.cache.store(storage, key, &completion).await;
        Ok(completion)
    }

    /// The shared gate for a cache key, created on first use.
    fn gate(&self, key: &CacheKey) -> Arc<tokio::sync::Mutex<()>> {
        self.inflight.lock().entry(key.clone()).or_default().clone()
    }
}
