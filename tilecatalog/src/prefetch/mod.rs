//! Bulk cache population for partition lists and tile subtrees.
//!
//! The engine resolves the catalog version once per run, fans metadata
//! queries and blob downloads out under a concurrency bound, and
//! reports serialized cumulative progress. Individual download
//! failures are counted but not fatal; an operation only errors when
//! the version or metadata stage fails, when cancellation fires, or
//! when nothing at all was prefetched.

mod engine;
mod types;

pub use engine::PrefetchEngine;
pub use types::{PrefetchProgress, ProgressCallback};
