//! Blob payload repository.

use crate::cache::{CacheKeyNamer, CacheStore};
use crate::client::{AsyncHttpClient, BlobApi};
use crate::error::ApiError;
use bytes::Bytes;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Fetches or reads cached blob payloads by data handle.
pub struct BlobRepository<C> {
    namer: CacheKeyNamer,
    cache: Arc<dyn CacheStore>,
    api: Arc<BlobApi<C>>,
}

impl<C: AsyncHttpClient> BlobRepository<C> {
    /// Creates a blob repository.
    pub fn new(namer: CacheKeyNamer, cache: Arc<dyn CacheStore>, api: Arc<BlobApi<C>>) -> Self {
        Self { namer, cache, api }
    }

    /// Returns the payload behind a handle, from cache or blob storage.
    pub async fn get(&self, data_handle: &str, token: &CancellationToken) -> Result<Bytes, ApiError> {
        let key = self.namer.data_key(data_handle);
        if let Some(payload) = self.cache.get(&key) {
            debug!(data_handle, "blob cache hit");
            return Ok(payload);
        }
        let (payload, _) = self.api.data(data_handle, token).await?;
        self.put_record(&key, payload.clone());
        Ok(payload)
    }

    /// Ensures the payload behind a handle is cached.
    ///
    /// Returns the bytes downloaded: 0 when the payload was already
    /// cached. Prefetch uses this to populate the cache without holding
    /// payloads.
    pub async fn fetch_into_cache(
        &self,
        data_handle: &str,
        token: &CancellationToken,
    ) -> Result<u64, ApiError> {
        let key = self.namer.data_key(data_handle);
        if self.cache.contains(&key) {
            debug!(data_handle, "blob already cached, skipping download");
            return Ok(0);
        }
        let (payload, bytes) = self.api.data(data_handle, token).await?;
        self.put_record(&key, payload);
        Ok(bytes)
    }

    /// Returns true when the payload behind a handle is cached.
    pub fn is_cached(&self, data_handle: &str) -> bool {
        self.cache.contains(&self.namer.data_key(data_handle))
    }

    fn put_record(&self, key: &str, payload: Bytes) {
        if let Err(e) = self.cache.put(key, payload, None) {
            warn!(key, error = %e, "failed to cache blob payload");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::InMemoryCacheStore;
    use crate::client::{ApiLookup, MockHttpClient};
    use crate::error::ErrorCode;

    const LOOKUP_BODY: &str = r#"[{"api":"blob","version":"v1","baseUrl":"http://blob.test/v1"}]"#;

    fn repository(
        mock: Arc<MockHttpClient>,
        cache: Arc<dyn CacheStore>,
    ) -> BlobRepository<MockHttpClient> {
        let lookup = Arc::new(ApiLookup::new(
            mock.clone(),
            "http://lookup.test/lookup/v1",
            "catalog-a",
        ));
        BlobRepository::new(
            CacheKeyNamer::new("catalog-a", "layer-b"),
            cache,
            Arc::new(BlobApi::new(mock, lookup, "layer-b")),
        )
    }

    #[tokio::test]
    async fn test_get_fetches_then_reads_cache() {
        let mock = Arc::new(MockHttpClient::new());
        mock.push_ok(200, LOOKUP_BODY);
        mock.push_ok(200, "payload");
        let cache: Arc<dyn CacheStore> = Arc::new(InMemoryCacheStore::new(None));
        let repository = repository(mock.clone(), cache);
        let token = CancellationToken::new();

        let payload = repository.get("h1", &token).await.unwrap();
        assert_eq!(payload, Bytes::from_static(b"payload"));
        let request_count = mock.requests().len();

        let payload = repository.get("h1", &token).await.unwrap();
        assert_eq!(payload, Bytes::from_static(b"payload"));
        assert_eq!(mock.requests().len(), request_count);
        assert!(repository.is_cached("h1"));
    }

    #[tokio::test]
    async fn test_fetch_into_cache_reports_downloaded_bytes() {
        let mock = Arc::new(MockHttpClient::new());
        mock.push_ok(200, LOOKUP_BODY);
        mock.push_ok(200, "payload");
        let cache: Arc<dyn CacheStore> = Arc::new(InMemoryCacheStore::new(None));
        let repository = repository(mock, cache);
        let token = CancellationToken::new();

        assert_eq!(repository.fetch_into_cache("h1", &token).await.unwrap(), 7);
        // Already cached: no download, no bytes.
        assert_eq!(repository.fetch_into_cache("h1", &token).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_missing_blob_surfaces_not_found() {
        let mock = Arc::new(MockHttpClient::new());
        mock.push_ok(200, LOOKUP_BODY);
        mock.push_ok(404, "");
        let cache: Arc<dyn CacheStore> = Arc::new(InMemoryCacheStore::new(None));
        let repository = repository(mock, cache);
        let token = CancellationToken::new();

        let err = repository.get("absent", &token).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::NotFound);
        assert!(!repository.is_cached("absent"));
    }
}
