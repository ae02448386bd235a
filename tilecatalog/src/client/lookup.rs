//! Resolution of logical API names to base URLs.

use super::models::Api;
use super::{decode_json, expect_success, fetch, AsyncHttpClient};
use crate::error::ApiError;
use dashmap::DashMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Default public lookup endpoint.
pub const DEFAULT_LOOKUP_URL: &str = "https://api-lookup.data.api.platform.here.com/lookup/v1";

/// Resolves logical service names for one catalog.
///
/// The lookup service answers with every API the catalog exposes; the
/// full response is cached on first use so later resolutions are
/// in-memory.
pub struct ApiLookup<C> {
    http: Arc<C>,
    lookup_url: String,
    catalog: String,
    resolved: DashMap<String, String>,
}

impl<C: AsyncHttpClient> ApiLookup<C> {
    /// Creates a lookup client for the given catalog.
    pub fn new(http: Arc<C>, lookup_url: impl Into<String>, catalog: impl Into<String>) -> Self {
        Self {
            http,
            lookup_url: lookup_url.into(),
            catalog: catalog.into(),
            resolved: DashMap::new(),
        }
    }

    /// Returns the base URL of `service`, fetching the catalog's API
    /// list on the first call.
    pub async fn base_url(
        &self,
        service: &str,
        token: &CancellationToken,
    ) -> Result<String, ApiError> {
        if let Some(url) = self.resolved.get(service) {
            debug!(service, catalog = %self.catalog, "API lookup cache hit");
            return Ok(url.clone());
        }

        info!(service, catalog = %self.catalog, "API lookup cache miss, requesting");
        let url = format!("{}/resources/{}/apis", self.lookup_url, self.catalog);
        let response = fetch(self.http.as_ref(), &url, token).await?;
        expect_success(&response, &url)?;
        let apis: Vec<Api> = decode_json(&response.body)?;
        for api in &apis {
            self.resolved.insert(api.api.clone(), api.base_url.clone());
        }

        self.resolved
            .get(service)
            .map(|url| url.clone())
            .ok_or_else(|| {
                ApiError::not_found(format!(
                    "Service {} not available for catalog {}",
                    service, self.catalog
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::MockHttpClient;

    const LOOKUP_BODY: &str = r#"[
        {"api":"metadata","version":"v1","baseUrl":"http://metadata.test/v1"},
        {"api":"query","version":"v1","baseUrl":"http://query.test/v1"},
        {"api":"blob","version":"v1","baseUrl":"http://blob.test/v1"}
    ]"#;

    fn lookup(mock: Arc<MockHttpClient>) -> ApiLookup<MockHttpClient> {
        ApiLookup::new(mock, "http://lookup.test/lookup/v1", "catalog-a")
    }

    #[tokio::test]
    async fn test_resolves_and_caches_services() {
        let mock = Arc::new(MockHttpClient::new());
        mock.push_ok(200, LOOKUP_BODY);
        let lookup = lookup(mock.clone());
        let token = CancellationToken::new();

        let query = lookup.base_url("query", &token).await.unwrap();
        assert_eq!(query, "http://query.test/v1");
        assert_eq!(
            mock.requests(),
            vec!["http://lookup.test/lookup/v1/resources/catalog-a/apis".to_string()]
        );

        // Second service comes from the cached response, no new request.
        let blob = lookup.base_url("blob", &token).await.unwrap();
        assert_eq!(blob, "http://blob.test/v1");
        assert_eq!(mock.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_service_is_not_found() {
        let mock = Arc::new(MockHttpClient::new());
        mock.push_ok(200, LOOKUP_BODY);
        let lookup = lookup(mock);
        let token = CancellationToken::new();

        let err = lookup.base_url("stream", &token).await.unwrap_err();
        assert_eq!(err.code(), crate::error::ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_lookup_http_error_surfaces() {
        let mock = Arc::new(MockHttpClient::new());
        mock.push_ok(500, "");
        let lookup = lookup(mock);
        let token = CancellationToken::new();

        let err = lookup.base_url("query", &token).await.unwrap_err();
        assert_eq!(err.http_status(), Some(500));
    }

    #[tokio::test]
    async fn test_lookup_parse_failure() {
        let mock = Arc::new(MockHttpClient::new());
        mock.push_ok(200, "not json");
        let lookup = lookup(mock);
        let token = CancellationToken::new();

        let err = lookup.base_url("query", &token).await.unwrap_err();
        assert_eq!(err.message(), "Fail parsing response.");
    }

    #[tokio::test]
    async fn test_cancelled_token_short_circuits() {
        let mock = Arc::new(MockHttpClient::new());
        let lookup = lookup(mock.clone());
        let token = CancellationToken::new();
        token.cancel();

        let err = lookup.base_url("query", &token).await.unwrap_err();
        assert!(err.is_cancelled());
        assert!(mock.requests().is_empty());
    }
}
