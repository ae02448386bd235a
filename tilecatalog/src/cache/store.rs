//! Cache store contract and the no-op implementation.

use super::types::CacheError;
use bytes::Bytes;
use std::time::Duration;

/// Key-value store holding the client's cache records.
///
/// Keys are arbitrary strings (see [`super::CacheKeyNamer`] for the
/// templates the client uses), values are raw byte buffers. Operations
/// are individually atomic and safe to call from any thread.
pub trait CacheStore: Send + Sync {
    /// Returns the value stored under `key`, if present and live.
    fn get(&self, key: &str) -> Option<Bytes>;

    /// Stores `value` under `key`.
    ///
    /// `ttl` overrides the store's default expiration for this record;
    /// `None` applies the default configured at construction.
    fn put(&self, key: &str, value: Bytes, ttl: Option<Duration>) -> Result<(), CacheError>;

    /// Returns true if `key` holds a live value.
    fn contains(&self, key: &str) -> bool;

    /// Removes `key`. Returns true when the key no longer exists,
    /// including when it was absent to begin with.
    fn remove(&self, key: &str) -> bool;

    /// Removes every key starting with `prefix`. Returns true when no
    /// matching key remains.
    fn remove_keys_with_prefix(&self, prefix: &str) -> bool;
}

/// Store that never retains anything.
///
/// Every read misses and every write is accepted and dropped. Useful
/// for running the client cache-less and for isolating network paths
/// in tests.
#[derive(Debug, Clone, Default)]
pub struct NoOpCacheStore;

impl NoOpCacheStore {
    /// Creates a new no-op store.
    pub fn new() -> Self {
        Self
    }
}

impl CacheStore for NoOpCacheStore {
    fn get(&self, _key: &str) -> Option<Bytes> {
        None
    }

    fn put(&self, _key: &str, _value: Bytes, _ttl: Option<Duration>) -> Result<(), CacheError> {
        Ok(())
    }

    fn contains(&self, _key: &str) -> bool {
        false
    }

    fn remove(&self, _key: &str) -> bool {
        true
    }

    fn remove_keys_with_prefix(&self, _prefix: &str) -> bool {
        true
    }
}
