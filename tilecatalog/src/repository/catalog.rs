//! Catalog version resolution and caching.

use crate::client::{AsyncHttpClient, MetadataApi};
use crate::error::ApiError;
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Resolves and remembers the catalog version the client operates at.
///
/// The latest version is fetched at most once and reused by every
/// subsequent operation; synchronous cache-facing operations read the
/// remembered value without touching the network.
pub struct CatalogVersionRepository<C> {
    metadata: Arc<MetadataApi<C>>,
    known: Mutex<Option<u64>>,
}

impl<C: AsyncHttpClient> CatalogVersionRepository<C> {
    /// Creates a version repository.
    pub fn new(metadata: Arc<MetadataApi<C>>) -> Self {
        Self {
            metadata,
            known: Mutex::new(None),
        }
    }

    /// Fixes the catalog version without ever fetching it.
    pub fn pin(&self, version: u64) {
        *self.known.lock().expect("version lock poisoned") = Some(version);
    }

    /// Returns the remembered version, if any has been resolved.
    pub fn known(&self) -> Option<u64> {
        *self.known.lock().expect("version lock poisoned")
    }

    /// Resolves the version for one operation.
    ///
    /// A request-supplied version wins and is not remembered; otherwise
    /// the remembered version is used, fetching the latest from the
    /// metadata service on first need. Returns the version and the
    /// response bytes transferred (0 unless a fetch happened).
    pub async fn resolve(
        &self,
        requested: Option<u64>,
        token: &CancellationToken,
    ) -> Result<(u64, u64), ApiError> {
        if let Some(version) = requested {
            return Ok((version, 0));
        }
        if let Some(version) = self.known() {
            return Ok((version, 0));
        }
        let (version, bytes) = self.metadata.latest_version(token).await?;
        debug!(version, "caching resolved catalog version");
        *self.known.lock().expect("version lock poisoned") = Some(version);
        Ok((version, bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{ApiLookup, MockHttpClient};

    const LOOKUP_BODY: &str =
        r#"[{"api":"metadata","version":"v1","baseUrl":"http://metadata.test/v1"}]"#;

    fn repository(mock: Arc<MockHttpClient>) -> CatalogVersionRepository<MockHttpClient> {
        let lookup = Arc::new(ApiLookup::new(
            mock.clone(),
            "http://lookup.test/lookup/v1",
            "catalog-a",
        ));
        CatalogVersionRepository::new(Arc::new(MetadataApi::new(mock, lookup)))
    }

    #[tokio::test]
    async fn test_latest_is_fetched_once() {
        let mock = Arc::new(MockHttpClient::new());
        mock.push_ok(200, LOOKUP_BODY);
        mock.push_ok(200, r#"{"version":108}"#);
        let repository = repository(mock.clone());
        let token = CancellationToken::new();

        let (version, bytes) = repository.resolve(None, &token).await.unwrap();
        assert_eq!(version, 108);
        assert!(bytes > 0);

        // Second resolution is answered from memory.
        let (version, bytes) = repository.resolve(None, &token).await.unwrap();
        assert_eq!(version, 108);
        assert_eq!(bytes, 0);
        assert_eq!(mock.requests().len(), 2);
        assert_eq!(repository.known(), Some(108));
    }

    #[tokio::test]
    async fn test_requested_version_wins_and_is_not_remembered() {
        let mock = Arc::new(MockHttpClient::new());
        let repository = repository(mock.clone());
        let token = CancellationToken::new();

        let (version, bytes) = repository.resolve(Some(42), &token).await.unwrap();
        assert_eq!(version, 42);
        assert_eq!(bytes, 0);
        assert!(mock.requests().is_empty());
        assert_eq!(repository.known(), None);
    }

    #[tokio::test]
    async fn test_pinned_version_skips_network() {
        let mock = Arc::new(MockHttpClient::new());
        let repository = repository(mock.clone());
        repository.pin(7);
        let token = CancellationToken::new();

        let (version, _) = repository.resolve(None, &token).await.unwrap();
        assert_eq!(version, 7);
        assert!(mock.requests().is_empty());
    }
}
