//! In-memory cache store with TTL expiry.

use super::store::CacheStore;
use super::types::CacheError;
use bytes::Bytes;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::trace;

/// Hook consulted before a record is evicted.
///
/// Implemented by the protection registry: a key reporting protected
/// survives TTL expiry until it is released.
pub trait EvictionGuard: Send + Sync {
    /// Returns true if `key` must not be evicted right now.
    fn is_protected(&self, key: &str) -> bool;
}

#[derive(Debug, Clone)]
struct Entry {
    value: Bytes,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

/// Thread-safe in-memory cache store.
///
/// Records expire lazily: an expired entry is dropped on the next read
/// touching it, unless the eviction guard reports it protected. A
/// default TTL applies to every put that does not carry its own;
/// without one, records live until removed.
pub struct InMemoryCacheStore {
    entries: DashMap<String, Entry>,
    default_ttl: Option<Duration>,
    guard: Option<Arc<dyn EvictionGuard>>,
}

impl InMemoryCacheStore {
    /// Creates a store with the given default record TTL.
    ///
    /// `None` means records do not expire.
    pub fn new(default_ttl: Option<Duration>) -> Self {
        Self {
            entries: DashMap::new(),
            default_ttl,
            guard: None,
        }
    }

    /// Attaches the eviction guard consulted before TTL eviction.
    pub fn with_eviction_guard(mut self, guard: Arc<dyn EvictionGuard>) -> Self {
        self.guard = Some(guard);
        self
    }

    /// Number of records currently held, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the store holds no records at all.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn is_protected(&self, key: &str) -> bool {
        self.guard.as_ref().is_some_and(|g| g.is_protected(key))
    }

    /// Drops `key` if it is expired and unprotected. Returns true when
    /// a live or protected value remains.
    fn sweep(&self, key: &str) -> bool {
        let now = Instant::now();
        let expired = match self.entries.get(key) {
            Some(entry) => entry.is_expired(now),
            None => return false,
        };
        if !expired {
            return true;
        }
        if self.is_protected(key) {
            return true;
        }
        trace!(key, "evicting expired cache record");
        self.entries.remove(key);
        false
    }
}

impl CacheStore for InMemoryCacheStore {
    fn get(&self, key: &str) -> Option<Bytes> {
        if !self.sweep(key) {
            return None;
        }
        self.entries.get(key).map(|entry| entry.value.clone())
    }

    fn put(&self, key: &str, value: Bytes, ttl: Option<Duration>) -> Result<(), CacheError> {
        let expires_at = ttl
            .or(self.default_ttl)
            .map(|ttl| Instant::now() + ttl);
        self.entries.insert(key.to_string(), Entry { value, expires_at });
        Ok(())
    }

    fn contains(&self, key: &str) -> bool {
        self.sweep(key)
    }

    fn remove(&self, key: &str) -> bool {
        self.entries.remove(key);
        true
    }

    fn remove_keys_with_prefix(&self, prefix: &str) -> bool {
        self.entries.retain(|key, _| !key.starts_with(prefix));
        true
    }
}
