//! Reference-counted pinning of cache keys against TTL eviction.

use super::memory::EvictionGuard;
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::debug;

/// The pair of keys pinned for one protected tile: its blob record and
/// the quad-tree record that resolves it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PinPair {
    /// Blob payload key of the tile.
    pub data_key: String,
    /// Key of the quad-tree covering the tile.
    pub quad_key: String,
}

#[derive(Debug, Default)]
struct Inner {
    data_refs: HashMap<String, u32>,
    quad_refs: HashMap<String, u32>,
}

impl Inner {
    fn contains(&self, key: &str) -> bool {
        self.data_refs.contains_key(key) || self.quad_refs.contains_key(key)
    }
}

/// Multiset of pinned cache keys.
///
/// Pinning a tile increments the refcount of its blob key and of its
/// covering quad-tree key; a quad-tree shared by several protected
/// tiles stays pinned until the last of them is released. The cache
/// store consults [`EvictionGuard::is_protected`] before evicting, so
/// any key with a positive count survives TTL expiry.
///
/// A single mutex guards the whole registry: protect and release are
/// atomic, and observers see either the pre-state or the post-state of
/// an entire key set.
#[derive(Debug, Default)]
pub struct ProtectionRegistry {
    inner: Mutex<Inner>,
}

impl ProtectionRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Pins every pair, incrementing both refcounts.
    pub fn pin(&self, pairs: &[PinPair]) {
        let mut inner = self.inner.lock().expect("protection registry poisoned");
        for pair in pairs {
            *inner.data_refs.entry(pair.data_key.clone()).or_insert(0) += 1;
            *inner.quad_refs.entry(pair.quad_key.clone()).or_insert(0) += 1;
        }
        debug!(pinned = pairs.len(), "pinned cache keys");
    }

    /// Releases every pair, decrementing both refcounts.
    ///
    /// Validates first and applies only if the whole set is currently
    /// pinned: on any shortfall nothing is decremented and `None` is
    /// returned. On success, returns the keys whose count dropped to
    /// zero — those are no longer protected and may be evicted by the
    /// caller.
    pub fn unpin(&self, pairs: &[PinPair]) -> Option<Vec<String>> {
        let mut inner = self.inner.lock().expect("protection registry poisoned");

        let mut needed_data: HashMap<&str, u32> = HashMap::new();
        let mut needed_quads: HashMap<&str, u32> = HashMap::new();
        for pair in pairs {
            *needed_data.entry(pair.data_key.as_str()).or_insert(0) += 1;
            *needed_quads.entry(pair.quad_key.as_str()).or_insert(0) += 1;
        }
        let covered = needed_data
            .iter()
            .all(|(key, needed)| inner.data_refs.get(*key).copied().unwrap_or(0) >= *needed)
            && needed_quads
                .iter()
                .all(|(key, needed)| inner.quad_refs.get(*key).copied().unwrap_or(0) >= *needed);
        if !covered {
            debug!("release rejected, not every key is protected");
            return None;
        }

        let mut released = Vec::new();
        for (key, needed) in needed_data {
            let drained = match inner.data_refs.get_mut(key) {
                Some(count) => {
                    *count -= needed;
                    *count == 0
                }
                None => false,
            };
            if drained {
                inner.data_refs.remove(key);
                released.push(key.to_string());
            }
        }
        for (key, needed) in needed_quads {
            let drained = match inner.quad_refs.get_mut(key) {
                Some(count) => {
                    *count -= needed;
                    *count == 0
                }
                None => false,
            };
            if drained {
                inner.quad_refs.remove(key);
                released.push(key.to_string());
            }
        }
        debug!(fully_released = released.len(), "released cache keys");
        Some(released)
    }

    /// Number of distinct keys currently pinned.
    pub fn pinned_key_count(&self) -> usize {
        let inner = self.inner.lock().expect("protection registry poisoned");
        inner.data_refs.len() + inner.quad_refs.len()
    }
}

impl EvictionGuard for ProtectionRegistry {
    fn is_protected(&self, key: &str) -> bool {
        let inner = self.inner.lock().expect("protection registry poisoned");
        inner.contains(key)
    }
}
