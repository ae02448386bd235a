//! Layer client façade binding cache, repositories, and prefetch.

use crate::cache::{
    CacheKeyNamer, CacheStore, InMemoryCacheStore, PinPair, ProtectionRegistry,
};
use crate::client::{
    ApiLookup, AsyncHttpClient, BlobApi, MetadataApi, QueryApi, ReqwestClient,
};
use crate::error::ApiError;
use crate::future::{spawn_operation, PendingRequest, ResponseCallback};
use crate::prefetch::{PrefetchEngine, ProgressCallback};
use crate::repository::{
    BlobRepository, CatalogVersionRepository, PartitionRepository, QuadTreeRepository,
};
use crate::request::{DataRequest, PrefetchPartitionsRequest, PrefetchTilesRequest, TileRequest};
use crate::settings::ClientSettings;
use crate::tile::TileKey;
use bytes::Bytes;
use std::sync::Arc;
use tracing::{info, warn};

/// Read client for one layer of a versioned catalog.
///
/// Binds the cache, the backend API clients, and the prefetch engine
/// behind the public operations. The client is movable but not
/// clonable: transferring ownership moves the whole read context, and
/// the moved-from binding is statically unusable afterwards.
///
/// Async operations return a [`PendingRequest`] carrying both a future
/// and a cancellation token; synchronous operations (`protect`,
/// `release`, `is_cached_*`, `remove_from_cache_*`) touch only the
/// cache and the protection registry.
///
/// # Example
///
/// ```no_run
/// use tilecatalog::layer::LayerClient;
/// use tilecatalog::request::DataRequest;
/// use tilecatalog::settings::ClientSettings;
///
/// # async fn run() -> Result<(), tilecatalog::error::ApiError> {
/// let client = LayerClient::new("my-catalog", "imagery", ClientSettings::new())?;
/// let request = DataRequest::new().with_partition_id("269");
/// let payload = client.get_data(request, None).wait().await?;
/// # Ok(())
/// # }
/// ```
pub struct LayerClient<C = ReqwestClient> {
    catalog: String,
    layer: String,
    namer: CacheKeyNamer,
    cache: Arc<dyn CacheStore>,
    registry: Arc<ProtectionRegistry>,
    version: Arc<CatalogVersionRepository<C>>,
    partitions: Arc<PartitionRepository<C>>,
    quads: Arc<QuadTreeRepository<C>>,
    blobs: Arc<BlobRepository<C>>,
    prefetch: Arc<PrefetchEngine<C>>,
}

impl LayerClient<ReqwestClient> {
    /// Creates a client using the real HTTP transport and an in-memory
    /// cache store honoring the settings' default TTL.
    pub fn new(
        catalog: impl Into<String>,
        layer: impl Into<String>,
        settings: ClientSettings,
    ) -> Result<Self, ApiError> {
        let http = ReqwestClient::with_timeout(settings.http_timeout_secs())?;
        Ok(Self::with_http_client(catalog, layer, settings, http))
    }
}

impl<C: AsyncHttpClient + 'static> LayerClient<C> {
    /// Creates a client over a custom HTTP transport.
    pub fn with_http_client(
        catalog: impl Into<String>,
        layer: impl Into<String>,
        settings: ClientSettings,
        http: C,
    ) -> Self {
        let registry = Arc::new(ProtectionRegistry::new());
        let cache: Arc<dyn CacheStore> = Arc::new(
            InMemoryCacheStore::new(settings.default_cache_expiration())
                .with_eviction_guard(registry.clone()),
        );
        Self::with_components(catalog, layer, settings, Arc::new(http), cache, registry)
    }

    /// Creates a client over a custom transport, cache store, and
    /// protection registry.
    ///
    /// The store must consult `registry` before evicting for protection
    /// to hold (see [`crate::cache::EvictionGuard`]).
    pub fn with_components(
        catalog: impl Into<String>,
        layer: impl Into<String>,
        settings: ClientSettings,
        http: Arc<C>,
        cache: Arc<dyn CacheStore>,
        registry: Arc<ProtectionRegistry>,
    ) -> Self {
        let catalog = catalog.into();
        let layer = layer.into();
        let namer = CacheKeyNamer::new(&catalog, &layer);
        let lookup = Arc::new(ApiLookup::new(http.clone(), settings.lookup_url(), &catalog));
        let query = Arc::new(QueryApi::new(http.clone(), lookup.clone(), &layer));
        let metadata = Arc::new(MetadataApi::new(http.clone(), lookup.clone()));
        let blob_api = Arc::new(BlobApi::new(http, lookup, &layer));

        let version = Arc::new(CatalogVersionRepository::new(metadata));
        let partitions = Arc::new(PartitionRepository::new(
            namer.clone(),
            cache.clone(),
            query.clone(),
        ));
        let quads = Arc::new(QuadTreeRepository::new(namer.clone(), cache.clone(), query));
        let blobs = Arc::new(BlobRepository::new(namer.clone(), cache.clone(), blob_api));
        let prefetch = Arc::new(PrefetchEngine::new(
            version.clone(),
            partitions.clone(),
            quads.clone(),
            blobs.clone(),
            settings.query_batch_size(),
            settings.prefetch_concurrency(),
        ));

        info!(catalog = %catalog, layer = %layer, "layer client created");
        Self {
            catalog,
            layer,
            namer,
            cache,
            registry,
            version,
            partitions,
            quads,
            blobs,
            prefetch,
        }
    }

    /// Pins a fixed catalog version instead of resolving the latest.
    pub fn with_version(self, version: u64) -> Self {
        self.version.pin(version);
        self
    }

    /// The catalog this client reads from.
    pub fn catalog(&self) -> &str {
        &self.catalog
    }

    /// The layer this client reads from.
    pub fn layer(&self) -> &str {
        &self.layer
    }

    /// Fetches payload data by partition ID or data handle.
    pub fn get_data(
        &self,
        request: DataRequest,
        callback: Option<ResponseCallback<Bytes>>,
    ) -> PendingRequest<Bytes> {
        let version = self.version.clone();
        let partitions = self.partitions.clone();
        let blobs = self.blobs.clone();
        spawn_operation(callback, move |token| async move {
            if request.partition_id().is_some() && request.data_handle().is_some() {
                return Err(ApiError::precondition_failed(
                    "Both partition id and data handle provided",
                ));
            }
            if let Some(data_handle) = request.data_handle() {
                return blobs.get(data_handle, &token).await;
            }
            let Some(partition_id) = request.partition_id() else {
                return Err(ApiError::precondition_failed(
                    "Neither partition id nor data handle provided",
                ));
            };
            let (resolved_version, _) = version.resolve(request.version(), &token).await?;
            let partition = partitions
                .resolve(partition_id, resolved_version, &token)
                .await?
                .ok_or_else(|| {
                    ApiError::not_found(format!("Partition {} not found", partition_id))
                })?;
            blobs.get(&partition.data_handle, &token).await
        })
    }

    /// Fetches payload data for a tile, resolving it through its
    /// covering quad-tree.
    pub fn get_tile(
        &self,
        request: TileRequest,
        callback: Option<ResponseCallback<Bytes>>,
    ) -> PendingRequest<Bytes> {
        let version = self.version.clone();
        let quads = self.quads.clone();
        let blobs = self.blobs.clone();
        spawn_operation(callback, move |token| async move {
            let Some(tile) = request.tile_key() else {
                return Err(ApiError::precondition_failed("No tile key provided"));
            };
            let (resolved_version, _) = version.resolve(request.version(), &token).await?;
            let resolved = quads.resolve(tile, resolved_version, &token).await?;
            let data_handle = resolved.and_then(|r| r.entry.data_handle).ok_or_else(|| {
                ApiError::not_found(format!("Tile {} not found", tile))
            })?;
            blobs.get(&data_handle, &token).await
        })
    }

    /// Bulk-prefetches partition payloads into the cache.
    pub fn prefetch_partitions(
        &self,
        request: PrefetchPartitionsRequest,
        progress: Option<ProgressCallback>,
        callback: Option<ResponseCallback<Vec<String>>>,
    ) -> PendingRequest<Vec<String>> {
        let prefetch = self.prefetch.clone();
        spawn_operation(callback, move |token| async move {
            prefetch
                .prefetch_partitions(request.partition_ids(), request.version(), progress, &token)
                .await
        })
    }

    /// Bulk-prefetches tile payloads into the cache.
    pub fn prefetch_tiles(
        &self,
        request: PrefetchTilesRequest,
        progress: Option<ProgressCallback>,
        callback: Option<ResponseCallback<Vec<TileKey>>>,
    ) -> PendingRequest<Vec<TileKey>> {
        let prefetch = self.prefetch.clone();
        spawn_operation(callback, move |token| async move {
            prefetch
                .prefetch_tiles(request.tile_keys(), request.version(), progress, &token)
                .await
        })
    }

    /// Pins the given tiles against TTL eviction.
    ///
    /// Every tile must resolve through a cached quad-tree to a data
    /// handle; the call is all-or-nothing and pins nothing when any
    /// tile fails to resolve. Protection covers the blob key and the
    /// covering quad-tree key — a protected tile whose blob is not yet
    /// cached keeps its eventual key exempt from eviction.
    pub fn protect(&self, tiles: &[TileKey]) -> bool {
        let Some(pairs) = self.resolve_pin_pairs(tiles) else {
            return false;
        };
        self.registry.pin(&pairs);
        info!(tiles = tiles.len(), "tiles protected");
        true
    }

    /// Releases previously protected tiles.
    ///
    /// Validates first: if any tile is not currently protected, nothing
    /// is released and the call fails. Keys whose refcount drops to
    /// zero are evicted from the cache immediately.
    pub fn release(&self, tiles: &[TileKey]) -> bool {
        let Some(pairs) = self.resolve_pin_pairs(tiles) else {
            return false;
        };
        match self.registry.unpin(&pairs) {
            Some(released) => {
                for key in &released {
                    self.cache.remove(key);
                }
                info!(tiles = tiles.len(), evicted = released.len(), "tiles released");
                true
            }
            None => false,
        }
    }

    /// Returns true when a partition's metadata and payload are cached.
    pub fn is_cached_partition(&self, partition_id: &str) -> bool {
        let Some(version) = self.version.known() else {
            return false;
        };
        self.partitions.is_cached(partition_id, version)
    }

    /// Returns true when a tile resolves through a cached quad-tree and
    /// its payload is cached.
    pub fn is_cached_tile(&self, tile: TileKey) -> bool {
        let Some(version) = self.version.known() else {
            return false;
        };
        self.quads
            .find_cached(tile, version)
            .and_then(|found| found.entry.data_handle)
            .is_some_and(|handle| self.blobs.is_cached(&handle))
    }

    /// Removes a partition's metadata and payload from the cache.
    ///
    /// Removing something that was never cached is a successful no-op.
    pub fn remove_from_cache_partition(&self, partition_id: &str) -> bool {
        let Some(version) = self.version.known() else {
            return true;
        };
        self.partitions.remove(partition_id, version)
    }

    /// Removes a tile's payload from the cache, and its covering
    /// quad-tree record once no sibling payload depends on it.
    pub fn remove_from_cache_tile(&self, tile: TileKey) -> bool {
        let Some(version) = self.version.known() else {
            return true;
        };
        self.quads.remove_tile(tile, version)
    }

    /// Resolves each tile to its pin pair through cached quad-trees
    /// only. `None` when the list is empty, the catalog version is
    /// unknown, or any tile lacks a cached mapping.
    fn resolve_pin_pairs(&self, tiles: &[TileKey]) -> Option<Vec<PinPair>> {
        if tiles.is_empty() {
            return None;
        }
        let Some(version) = self.version.known() else {
            warn!("no catalog version resolved yet, cannot derive cache keys");
            return None;
        };
        let mut pairs = Vec::with_capacity(tiles.len());
        for tile in tiles {
            let found = self.quads.find_cached(*tile, version);
            let Some(found) = found else {
                warn!(tile = %tile, "tile has no cached quad-tree");
                return None;
            };
            let Some(handle) = found.entry.data_handle else {
                warn!(tile = %tile, "tile has no resolvable data handle");
                return None;
            };
            pairs.push(PinPair {
                data_key: self.namer.data_key(&handle),
                quad_key: found.quad_key,
            });
        }
        Some(pairs)
    }
}
