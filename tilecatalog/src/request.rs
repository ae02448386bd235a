//! Request types for the public layer client operations.

use crate::tile::TileKey;

/// Request for partition- or handle-addressed payload data.
///
/// Exactly one of partition ID and data handle must be set; supplying
/// both or neither fails the request with a precondition error.
///
/// # Example
///
/// ```
/// use tilecatalog::request::DataRequest;
///
/// let request = DataRequest::new().with_partition_id("269");
/// assert_eq!(request.partition_id(), Some("269"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct DataRequest {
    partition_id: Option<String>,
    data_handle: Option<String>,
    version: Option<u64>,
}

impl DataRequest {
    /// Creates an empty request.
    pub fn new() -> Self {
        Self::default()
    }

    /// Selects the payload by partition ID.
    pub fn with_partition_id(mut self, partition_id: impl Into<String>) -> Self {
        self.partition_id = Some(partition_id.into());
        self
    }

    /// Selects the payload directly by data handle, skipping the
    /// partition query.
    pub fn with_data_handle(mut self, data_handle: impl Into<String>) -> Self {
        self.data_handle = Some(data_handle.into());
        self
    }

    /// Pins the catalog version for this request.
    pub fn with_version(mut self, version: u64) -> Self {
        self.version = Some(version);
        self
    }

    /// Returns the partition ID selector, if set.
    pub fn partition_id(&self) -> Option<&str> {
        self.partition_id.as_deref()
    }

    /// Returns the data handle selector, if set.
    pub fn data_handle(&self) -> Option<&str> {
        self.data_handle.as_deref()
    }

    /// Returns the pinned catalog version, if set.
    pub fn version(&self) -> Option<u64> {
        self.version
    }
}

/// Request for tile-addressed payload data.
#[derive(Debug, Clone, Copy, Default)]
pub struct TileRequest {
    tile_key: Option<TileKey>,
    version: Option<u64>,
}

impl TileRequest {
    /// Creates an empty request.
    pub fn new() -> Self {
        Self::default()
    }

    /// Selects the tile to read.
    pub fn with_tile_key(mut self, tile_key: TileKey) -> Self {
        self.tile_key = Some(tile_key);
        self
    }

    /// Pins the catalog version for this request.
    pub fn with_version(mut self, version: u64) -> Self {
        self.version = Some(version);
        self
    }

    /// Returns the selected tile, if set.
    pub fn tile_key(&self) -> Option<TileKey> {
        self.tile_key
    }

    /// Returns the pinned catalog version, if set.
    pub fn version(&self) -> Option<u64> {
        self.version
    }
}

/// Request to bulk-prefetch a list of partitions.
#[derive(Debug, Clone, Default)]
pub struct PrefetchPartitionsRequest {
    partition_ids: Vec<String>,
    version: Option<u64>,
}

impl PrefetchPartitionsRequest {
    /// Creates an empty request.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the partition IDs to prefetch.
    pub fn with_partition_ids<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.partition_ids = ids.into_iter().map(Into::into).collect();
        self
    }

    /// Pins the catalog version for this request.
    pub fn with_version(mut self, version: u64) -> Self {
        self.version = Some(version);
        self
    }

    /// Returns the partition IDs to prefetch.
    pub fn partition_ids(&self) -> &[String] {
        &self.partition_ids
    }

    /// Returns the pinned catalog version, if set.
    pub fn version(&self) -> Option<u64> {
        self.version
    }
}

/// Request to bulk-prefetch a list of tiles.
#[derive(Debug, Clone, Default)]
pub struct PrefetchTilesRequest {
    tile_keys: Vec<TileKey>,
    version: Option<u64>,
}

impl PrefetchTilesRequest {
    /// Creates an empty request.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the tiles to prefetch.
    pub fn with_tile_keys<I>(mut self, tiles: I) -> Self
    where
        I: IntoIterator<Item = TileKey>,
    {
        self.tile_keys = tiles.into_iter().collect();
        self
    }

    /// Pins the catalog version for this request.
    pub fn with_version(mut self, version: u64) -> Self {
        self.version = Some(version);
        self
    }

    /// Returns the tiles to prefetch.
    pub fn tile_keys(&self) -> &[TileKey] {
        &self.tile_keys
    }

    /// Returns the pinned catalog version, if set.
    pub fn version(&self) -> Option<u64> {
        self.version
    }
}
