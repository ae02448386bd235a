//! Metadata API client.

use super::models::VersionResponse;
use super::{decode_json, expect_success, fetch, ApiLookup, AsyncHttpClient};
use crate::error::ApiError;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Client for the catalog metadata service.
pub struct MetadataApi<C> {
    http: Arc<C>,
    lookup: Arc<ApiLookup<C>>,
}

impl<C: AsyncHttpClient> MetadataApi<C> {
    /// Creates a metadata client.
    pub fn new(http: Arc<C>, lookup: Arc<ApiLookup<C>>) -> Self {
        Self { http, lookup }
    }

    /// Fetches the current catalog version.
    ///
    /// Returns the version together with the response bytes
    /// transferred, for prefetch network accounting.
    pub async fn latest_version(&self, token: &CancellationToken) -> Result<(u64, u64), ApiError> {
        let base = self.lookup.base_url("metadata", token).await?;
        let url = format!("{}/versions/latest", base);
        let response = fetch(self.http.as_ref(), &url, token).await?;
        let bytes = response.body.len() as u64;
        expect_success(&response, &url)?;
        let decoded: VersionResponse = decode_json(&response.body)?;
        debug!(version = decoded.version, "resolved latest catalog version");
        Ok((decoded.version, bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::MockHttpClient;
    use crate::error::ErrorCode;

    fn metadata(mock: Arc<MockHttpClient>) -> MetadataApi<MockHttpClient> {
        let lookup = Arc::new(ApiLookup::new(
            mock.clone(),
            "http://lookup.test/lookup/v1",
            "catalog-a",
        ));
        MetadataApi::new(mock, lookup)
    }

    const LOOKUP_BODY: &str =
        r#"[{"api":"metadata","version":"v1","baseUrl":"http://metadata.test/v1"}]"#;

    #[tokio::test]
    async fn test_latest_version() {
        let mock = Arc::new(MockHttpClient::new());
        mock.push_ok(200, LOOKUP_BODY);
        mock.push_ok(200, r#"{"version":108}"#);
        let api = metadata(mock.clone());
        let token = CancellationToken::new();

        let (version, bytes) = api.latest_version(&token).await.unwrap();
        assert_eq!(version, 108);
        assert_eq!(bytes, r#"{"version":108}"#.len() as u64);
        assert_eq!(
            mock.requests().last().unwrap(),
            "http://metadata.test/v1/versions/latest"
        );
    }

    #[tokio::test]
    async fn test_latest_version_parse_failure() {
        let mock = Arc::new(MockHttpClient::new());
        mock.push_ok(200, LOOKUP_BODY);
        mock.push_ok(200, "garbage");
        let api = metadata(mock);
        let token = CancellationToken::new();

        let err = api.latest_version(&token).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::Unknown);
    }

    #[tokio::test]
    async fn test_latest_version_http_error() {
        let mock = Arc::new(MockHttpClient::new());
        mock.push_ok(200, LOOKUP_BODY);
        mock.push_ok(403, "");
        let api = metadata(mock);
        let token = CancellationToken::new();

        let err = api.latest_version(&token).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::BadRequest);
    }
}
