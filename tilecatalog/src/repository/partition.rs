//! Partition metadata repository.

use crate::cache::{CacheKeyNamer, CacheStore};
use crate::client::{AsyncHttpClient, Partition, QueryApi};
use crate::error::ApiError;
use bytes::Bytes;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Resolves partition IDs to data handles, caching the metadata.
pub struct PartitionRepository<C> {
    namer: CacheKeyNamer,
    cache: Arc<dyn CacheStore>,
    query: Arc<QueryApi<C>>,
}

impl<C: AsyncHttpClient> PartitionRepository<C> {
    /// Creates a partition repository.
    pub fn new(namer: CacheKeyNamer, cache: Arc<dyn CacheStore>, query: Arc<QueryApi<C>>) -> Self {
        Self {
            namer,
            cache,
            query,
        }
    }

    /// Returns the cached partition record, if one is live.
    pub fn cached(&self, partition_id: &str, version: u64) -> Option<Partition> {
        let key = self.namer.partition_key(partition_id, version);
        let bytes = self.cache.get(&key)?;
        match serde_json::from_slice(&bytes) {
            Ok(partition) => Some(partition),
            Err(_) => {
                warn!(key, "corrupt partition record dropped");
                self.cache.remove(&key);
                None
            }
        }
    }

    /// Resolves one partition, from cache or the query API.
    ///
    /// `Ok(None)` means the catalog has no such partition at this
    /// version.
    pub async fn resolve(
        &self,
        partition_id: &str,
        version: u64,
        token: &CancellationToken,
    ) -> Result<Option<Partition>, ApiError> {
        if let Some(partition) = self.cached(partition_id, version) {
            debug!(partition_id, version, "partition metadata cache hit");
            return Ok(Some(partition));
        }
        let ids = [partition_id.to_string()];
        let (partitions, _) = self.query.partitions(&ids, version, token).await?;
        let found = partitions
            .into_iter()
            .find(|p| p.partition == partition_id);
        if let Some(partition) = &found {
            self.put_record(partition, version);
        }
        Ok(found)
    }

    /// Fetches metadata for a batch of partition IDs, caching every
    /// resolved record. Returns the partitions and the response bytes
    /// transferred.
    pub async fn query_batch(
        &self,
        ids: &[String],
        version: u64,
        token: &CancellationToken,
    ) -> Result<(Vec<Partition>, u64), ApiError> {
        let (partitions, bytes) = self.query.partitions(ids, version, token).await?;
        for partition in &partitions {
            self.put_record(partition, version);
        }
        Ok((partitions, bytes))
    }

    /// Removes a partition's metadata and blob records.
    ///
    /// Absent partitions are a successful no-op; failure is reported
    /// only when an existing entry could not be purged.
    pub fn remove(&self, partition_id: &str, version: u64) -> bool {
        let Some(partition) = self.cached(partition_id, version) else {
            debug!(partition_id, version, "partition not cached, nothing to remove");
            return true;
        };
        let partition_prefix = self.namer.partition_key(partition_id, version);
        let data_prefix = self.namer.data_key(&partition.data_handle);
        let removed = self.cache.remove_keys_with_prefix(&partition_prefix)
            && self.cache.remove_keys_with_prefix(&data_prefix);
        debug!(partition_id, version, removed, "partition removed from cache");
        removed
    }

    /// Returns true when both the partition metadata and its blob
    /// payload are cached.
    pub fn is_cached(&self, partition_id: &str, version: u64) -> bool {
        self.cached(partition_id, version)
            .is_some_and(|p| self.cache.contains(&self.namer.data_key(&p.data_handle)))
    }

    fn put_record(&self, partition: &Partition, version: u64) {
        let key = self.namer.partition_key(&partition.partition, version);
        match serde_json::to_vec(partition) {
            Ok(encoded) => {
                if let Err(e) = self.cache.put(&key, Bytes::from(encoded), None) {
                    warn!(key, error = %e, "failed to cache partition record");
                }
            }
            Err(e) => warn!(key, error = %e, "failed to encode partition record"),
        }
    }
}
