//! Cache layer: store contract, key naming, and protection.
//!
//! The client persists three record kinds — partition metadata, blob
//! payloads, and packed quad-tree indexes — under deterministic string
//! keys derived by [`CacheKeyNamer`]. The storage engine itself sits
//! behind the [`CacheStore`] trait so disk-backed engines can be swapped
//! in; [`InMemoryCacheStore`] is the in-process reference
//! implementation with TTL expiry. [`ProtectionRegistry`] pins keys
//! against TTL eviction with reference counts.

mod keys;
mod memory;
mod protect;
mod store;
mod types;

pub use keys::CacheKeyNamer;
pub use memory::{EvictionGuard, InMemoryCacheStore};
pub use protect::{PinPair, ProtectionRegistry};
pub use store::{CacheStore, NoOpCacheStore};
pub use types::CacheError;
