//! Cache-or-fetch repositories.
//!
//! Each repository fronts one record kind: it answers from the cache
//! when it can, falls back to the matching backend API otherwise, and
//! writes fetched results back. Removal and cached-only lookups are
//! synchronous; anything that may touch the network is async and
//! honors the operation's cancellation token.

mod blob;
mod catalog;
mod partition;
mod quadtree;

pub use blob::BlobRepository;
pub use catalog::CatalogVersionRepository;
pub use partition::PartitionRepository;
pub use quadtree::{QuadTreeRepository, ResolvedTile, QUAD_TREE_DEPTH};
