//! Prefetch orchestration.

use super::types::{ProgressCallback, ProgressTracker};
use crate::client::AsyncHttpClient;
use crate::error::{ApiError, ErrorCode};
use crate::repository::{
    BlobRepository, CatalogVersionRepository, PartitionRepository, QuadTreeRepository,
    QUAD_TREE_DEPTH,
};
use crate::tile::TileKey;
use futures::future::join_all;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Bulk download orchestrator shared by both prefetch flavors.
pub struct PrefetchEngine<C> {
    version: Arc<CatalogVersionRepository<C>>,
    partitions: Arc<PartitionRepository<C>>,
    quads: Arc<QuadTreeRepository<C>>,
    blobs: Arc<BlobRepository<C>>,
    batch_size: usize,
    concurrency: usize,
}

impl<C: AsyncHttpClient> PrefetchEngine<C> {
    /// Creates an engine over the shared repositories.
    ///
    /// `batch_size` caps partition IDs per metadata query (the backend
    /// accepts at most 100); `concurrency` bounds in-flight blob
    /// downloads.
    pub fn new(
        version: Arc<CatalogVersionRepository<C>>,
        partitions: Arc<PartitionRepository<C>>,
        quads: Arc<QuadTreeRepository<C>>,
        blobs: Arc<BlobRepository<C>>,
        batch_size: usize,
        concurrency: usize,
    ) -> Self {
        Self {
            version,
            partitions,
            quads,
            blobs,
            batch_size: batch_size.clamp(1, 100),
            concurrency: concurrency.max(1),
        }
    }

    /// Prefetches blob payloads for a list of partition IDs.
    ///
    /// Returns the IDs whose payloads were downloaded (or already
    /// cached). Partitions unknown to the catalog or failing to
    /// download count toward progress but not toward the result; a run
    /// where nothing succeeds is an error.
    pub async fn prefetch_partitions(
        &self,
        ids: &[String],
        version: Option<u64>,
        progress: Option<ProgressCallback>,
        token: &CancellationToken,
    ) -> Result<Vec<String>, ApiError> {
        if ids.is_empty() {
            warn!("prefetch rejected, empty partition list");
            return Err(ApiError::invalid_argument("Empty partition list"));
        }
        info!(partitions = ids.len(), "partition prefetch starting");
        let tracker = ProgressTracker::new(ids.len(), progress);

        let (version, version_bytes) = self.version.resolve(version, token).await?;
        tracker.add_bytes(version_bytes);

        // Metadata stage: any batch failing fatally aborts the run.
        let batch_results = join_all(
            ids.chunks(self.batch_size)
                .map(|chunk| self.partitions.query_batch(chunk, version, token)),
        )
        .await;
        let mut resolved = HashMap::new();
        for result in batch_results {
            let (partitions, bytes) = result?;
            tracker.add_bytes(bytes);
            for partition in partitions {
                resolved.insert(partition.partition.clone(), partition.data_handle);
            }
        }
        if token.is_cancelled() {
            return Err(ApiError::cancelled());
        }

        let mut downloads = Vec::new();
        for id in ids {
            match resolved.remove(id) {
                Some(data_handle) => downloads.push((id.clone(), data_handle)),
                None => {
                    debug!(partition = %id, "partition not in catalog, counted as attempted");
                    tracker.complete_one(0);
                }
            }
        }

        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let results = join_all(downloads.into_iter().map(|(id, data_handle)| {
            let semaphore = Arc::clone(&semaphore);
            let tracker = &tracker;
            async move {
                let Ok(_permit) = semaphore.acquire().await else {
                    return None;
                };
                if token.is_cancelled() {
                    return None;
                }
                match self.blobs.fetch_into_cache(&data_handle, token).await {
                    Ok(bytes) => {
                        tracker.complete_one(bytes);
                        Some(id)
                    }
                    Err(e) if e.is_cancelled() => None,
                    Err(e) => {
                        warn!(partition = %id, error = %e, "partition prefetch failed");
                        tracker.complete_one(0);
                        None
                    }
                }
            }
        }))
        .await;
        if token.is_cancelled() {
            return Err(ApiError::cancelled());
        }

        let prefetched: Vec<String> = results.into_iter().flatten().collect();
        let progress = tracker.snapshot();
        info!(
            prefetched = prefetched.len(),
            total = progress.total_partitions_to_prefetch,
            bytes = progress.bytes_transferred,
            "partition prefetch finished"
        );
        if prefetched.is_empty() {
            return Err(ApiError::new(
                ErrorCode::Unknown,
                "No partitions were prefetched.",
            ));
        }
        Ok(prefetched)
    }

    /// Prefetches blob payloads for a list of tiles.
    ///
    /// Tiles are batched by covering quad-tree root so each root's
    /// index is loaded once. Tiles without a resolvable handle and
    /// failed downloads count toward progress but not the result.
    pub async fn prefetch_tiles(
        &self,
        tiles: &[TileKey],
        version: Option<u64>,
        progress: Option<ProgressCallback>,
        token: &CancellationToken,
    ) -> Result<Vec<TileKey>, ApiError> {
        if tiles.is_empty() {
            warn!("prefetch rejected, empty tile key list");
            return Err(ApiError::invalid_argument("Empty tile key list"));
        }
        info!(tiles = tiles.len(), "tile prefetch starting");
        let tracker = ProgressTracker::new(tiles.len(), progress);

        let (version, version_bytes) = self.version.resolve(version, token).await?;
        tracker.add_bytes(version_bytes);

        let mut by_root: BTreeMap<TileKey, Vec<TileKey>> = BTreeMap::new();
        for tile in tiles {
            let root = tile.changed_level_by(-(i32::from(QUAD_TREE_DEPTH)));
            by_root.entry(root).or_default().push(*tile);
        }
        debug!(roots = by_root.len(), "tile prefetch sliced by quad-tree root");

        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let group_results = join_all(by_root.into_iter().map(|(root, group)| {
            let semaphore = Arc::clone(&semaphore);
            let tracker = &tracker;
            async move {
                let index = match self.quads.load_or_fetch_root(root, version, token).await {
                    Ok((index, bytes)) => {
                        tracker.add_bytes(bytes);
                        index
                    }
                    Err(e) => {
                        if !e.is_cancelled() {
                            warn!(root = %root, error = %e, "quad-tree load failed");
                            for _ in &group {
                                tracker.complete_one(0);
                            }
                        }
                        return Vec::new();
                    }
                };
                let mut prefetched = Vec::new();
                for tile in group {
                    let data_handle = index.find(tile).and_then(|entry| entry.data_handle);
                    let Some(data_handle) = data_handle else {
                        debug!(tile = %tile, "tile has no resolvable handle");
                        tracker.complete_one(0);
                        continue;
                    };
                    let Ok(_permit) = semaphore.acquire().await else {
                        break;
                    };
                    if token.is_cancelled() {
                        break;
                    }
                    match self.blobs.fetch_into_cache(&data_handle, token).await {
                        Ok(bytes) => {
                            tracker.complete_one(bytes);
                            prefetched.push(tile);
                        }
                        Err(e) if e.is_cancelled() => break,
                        Err(e) => {
                            warn!(tile = %tile, error = %e, "tile prefetch failed");
                            tracker.complete_one(0);
                        }
                    }
                }
                prefetched
            }
        }))
        .await;
        if token.is_cancelled() {
            return Err(ApiError::cancelled());
        }

        let prefetched: Vec<TileKey> = group_results.into_iter().flatten().collect();
        let progress = tracker.snapshot();
        info!(
            prefetched = prefetched.len(),
            total = progress.total_partitions_to_prefetch,
            bytes = progress.bytes_transferred,
            "tile prefetch finished"
        );
        if prefetched.is_empty() {
            return Err(ApiError::new(ErrorCode::Unknown, "No tiles were prefetched."));
        }
        Ok(prefetched)
    }
}
