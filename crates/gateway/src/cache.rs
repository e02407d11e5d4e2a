//! Two-tier response cache: a bounded in-process LRU in front of the
//! durable completion store.

use anyhow::Result;
use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;
use store::{CacheKey, Completion, CompletionStore};

/// Default capacity of the volatile tier.
pub const DEFAULT_CACHE_CAPACITY: usize = 256;

/// The volatile cache tier plus the lookup/store/purge protocol against
/// the durable tier.
///
/// The durable store is passed per call rather than owned, so the same
/// storage backend can serve history, projects, and the cache without
/// being split up.
pub struct ResponseCache {
    volatile: Mutex<LruCache<CacheKey, Completion>>,
}

impl ResponseCache {
    /// Create a cache whose volatile tier holds at most `capacity`
    /// entries (a zero capacity is clamped to one).
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            volatile: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Look up a completion: volatile tier first, then the durable tier.
    ///
    /// A durable hit is promoted into the volatile tier before
    /// returning, so a repeated identical request in this process
    /// resolves without another durable round trip. Durable read
    /// failures degrade to a miss.
    pub async fn lookup<S: CompletionStore>(&self, durable: &S, key: &CacheKey) -> Option<Completion> {
        if let Some(hit) = self.volatile.lock().get(key).cloned() {
            return Some(hit);
        }

        match durable.lookup(key).await {
            Ok(Some(completion)) => {
                self.volatile.lock().put(key.clone(), completion.clone());
                Some(completion)
            }
            Ok(None) => None,
            Err(error) => {
                tracing::warn!("durable cache lookup failed for {key}: {error:#}");
                None
            }
        }
    }

    /// Write a completion through both tiers.
    ///
    /// The durable tier is written first, so a crash between the two
    /// writes never leaves only an unrecoverable volatile copy. A
    /// durable write failure is logged and swallowed; the volatile tier
    /// is written regardless.
    pub async fn store<S: CompletionStore>(
        &self,
        durable: &S,
        key: &CacheKey,
        completion: &Completion,
    ) {
        if let Err(error) = durable.store(key, completion).await {
            tracing::warn!("durable cache write failed for {key}: {error:#}");
        }
        self.volatile.lock().put(key.clone(), completion.clone());
    }

    /// Drop every entry scoped to a conversation from both tiers.
    pub async fn purge<S: CompletionStore>(&self, durable: &S, conversation: &str) -> Result<()> {
        durable.purge(conversation).await?;

        let mut volatile = self.volatile.lock();
        let stale: Vec<CacheKey> = volatile
            .iter()
            .filter(|(key, _)| key.conversation == conversation)
            .map(|(key, _)| key.clone())
            .collect();
        for key in stale {
            volatile.pop(&key);
        }
        Ok(())
    }

    /// Whether the volatile tier currently holds `key`. Test hook; does
    /// not touch recency.
    pub fn contains_volatile(&self, key: &CacheKey) -> bool {
        self.volatile.lock().peek(key).is_some()
    }
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}
