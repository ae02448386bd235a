//! Quad-tree repository: ancestor-walking tile resolution and removal.

use crate::cache::{CacheKeyNamer, CacheStore};
use crate::client::{AsyncHttpClient, QueryApi};
use crate::error::ApiError;
use crate::index::{QuadTreeIndex, TileEntry};
use crate::tile::TileKey;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Depth every quad-tree request and cache record covers.
pub const QUAD_TREE_DEPTH: u8 = 4;

/// A tile resolved through its covering quad-tree.
#[derive(Debug, Clone)]
pub struct ResolvedTile {
    /// The quad-tree index that owns the tile.
    pub index: QuadTreeIndex,
    /// Cache key of the owning quad-tree record.
    pub quad_key: String,
    /// The tile's entry within the index.
    pub entry: TileEntry,
}

/// Resolves tile keys through cached or fetched quad-tree indexes.
///
/// A tile's mapping can live in the quad-tree rooted at the tile itself
/// or in one rooted up to [`QUAD_TREE_DEPTH`] levels above it, since
/// every record covers that many descendant levels. Resolution walks
/// those candidate roots through the cache before fetching the deepest
/// missing one.
pub struct QuadTreeRepository<C> {
    namer: CacheKeyNamer,
    cache: Arc<dyn CacheStore>,
    query: Arc<QueryApi<C>>,
}

impl<C: AsyncHttpClient> QuadTreeRepository<C> {
    /// Creates a quad-tree repository.
    pub fn new(namer: CacheKeyNamer, cache: Arc<dyn CacheStore>, query: Arc<QueryApi<C>>) -> Self {
        Self {
            namer,
            cache,
            query,
        }
    }

    /// Walks the candidate ancestor roots in the cache only.
    ///
    /// Returns the first cached quad-tree that owns the tile. Never
    /// touches the network; protection and cached-state queries rely on
    /// that.
    pub fn find_cached(&self, tile: TileKey, version: u64) -> Option<ResolvedTile> {
        let max_distance = u32::from(QUAD_TREE_DEPTH).min(tile.level());
        for distance in 0..=max_distance {
            let root = tile.changed_level_by(-(distance as i32));
            let quad_key = self.namer.quadtree_key(root, version, QUAD_TREE_DEPTH);
            let Some(buffer) = self.cache.get(&quad_key) else {
                continue;
            };
            match QuadTreeIndex::from_blob(buffer) {
                Ok(index) => {
                    if let Some(entry) = index.find(tile) {
                        debug!(tile = %tile, distance, "tile resolved from cached quad-tree");
                        return Some(ResolvedTile {
                            index,
                            quad_key,
                            entry,
                        });
                    }
                }
                Err(e) => {
                    warn!(quad_key, error = %e, "corrupt quad-tree record dropped");
                    self.cache.remove(&quad_key);
                }
            }
        }
        None
    }

    /// Resolves a tile, fetching its covering quad-tree on cache miss.
    ///
    /// The fetch is rooted [`QUAD_TREE_DEPTH`] levels above the tile,
    /// so one response also covers the tile's nearby siblings.
    pub async fn resolve(
        &self,
        tile: TileKey,
        version: u64,
        token: &CancellationToken,
    ) -> Result<Option<ResolvedTile>, ApiError> {
        if let Some(found) = self.find_cached(tile, version) {
            return Ok(Some(found));
        }
        let root = tile.changed_level_by(-i32::from(QUAD_TREE_DEPTH));
        let (index, _) = self.fetch_root(root, version, token).await?;
        let quad_key = self.namer.quadtree_key(root, version, QUAD_TREE_DEPTH);
        Ok(index.find(tile).map(|entry| ResolvedTile {
            index,
            quad_key,
            entry,
        }))
    }

    /// Loads a quad-tree rooted exactly at `root`, fetching on miss.
    ///
    /// Returns the index and the response bytes transferred (0 on cache
    /// hit). Used by tile prefetch, which batches work per root.
    pub async fn load_or_fetch_root(
        &self,
        root: TileKey,
        version: u64,
        token: &CancellationToken,
    ) -> Result<(QuadTreeIndex, u64), ApiError> {
        let quad_key = self.namer.quadtree_key(root, version, QUAD_TREE_DEPTH);
        if let Some(buffer) = self.cache.get(&quad_key) {
            if let Ok(index) = QuadTreeIndex::from_blob(buffer) {
                return Ok((index, 0));
            }
            warn!(quad_key, "corrupt quad-tree record dropped");
            self.cache.remove(&quad_key);
        }
        self.fetch_root(root, version, token).await
    }

    /// Removes a tile's blob and, if orphaned, its covering quad-tree.
    ///
    /// The quad-tree record is kept while any other tile listed in it
    /// still has a cached blob, so sibling lookups keep working without
    /// a refetch. Returns false only when a removal that should have
    /// succeeded failed.
    pub fn remove_tile(&self, tile: TileKey, version: u64) -> bool {
        let Some(found) = self.find_cached(tile, version) else {
            debug!(tile = %tile, version, "tile not cached, nothing to remove");
            return true;
        };
        if let Some(handle) = &found.entry.data_handle {
            if !self.cache.remove_keys_with_prefix(&self.namer.data_key(handle)) {
                return false;
            }
        }
        let still_serving = found.index.sub_entries().any(|(_, entry)| {
            entry
                .data_handle
                .as_deref()
                .is_some_and(|handle| self.cache.contains(&self.namer.data_key(handle)))
        });
        if still_serving {
            debug!(tile = %tile, "quad-tree retained, sibling blobs still cached");
            return true;
        }
        debug!(quad_key = %found.quad_key, "evicting orphaned quad-tree");
        self.cache.remove(&found.quad_key)
    }

    async fn fetch_root(
        &self,
        root: TileKey,
        version: u64,
        token: &CancellationToken,
    ) -> Result<(QuadTreeIndex, u64), ApiError> {
        let (decoded, bytes) = self
            .query
            .quadtree(root, QUAD_TREE_DEPTH, version, token)
            .await?;
        let index = QuadTreeIndex::build(root, QUAD_TREE_DEPTH, decoded.into_nodes(root));
        let quad_key = self.namer.quadtree_key(root, version, QUAD_TREE_DEPTH);
        if let Err(e) = self.cache.put(&quad_key, index.to_bytes(), None) {
            warn!(quad_key, error = %e, "failed to cache quad-tree record");
        }
        Ok((index, bytes))
    }
}
