//! Blob API client.

use super::{expect_success, fetch, ApiLookup, AsyncHttpClient};
use crate::error::ApiError;
use bytes::Bytes;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Client for the blob storage service of one layer.
pub struct BlobApi<C> {
    http: Arc<C>,
    lookup: Arc<ApiLookup<C>>,
    layer: String,
}

impl<C: AsyncHttpClient> BlobApi<C> {
    /// Creates a blob client bound to a layer.
    pub fn new(http: Arc<C>, lookup: Arc<ApiLookup<C>>, layer: impl Into<String>) -> Self {
        Self {
            http,
            lookup,
            layer: layer.into(),
        }
    }

    /// Downloads the payload behind a data handle.
    ///
    /// Returns the payload and the response bytes transferred (equal to
    /// the payload length on success).
    pub async fn data(
        &self,
        data_handle: &str,
        token: &CancellationToken,
    ) -> Result<(Bytes, u64), ApiError> {
        let base = self.lookup.base_url("blob", token).await?;
        let url = format!("{}/layers/{}/data/{}", base, self.layer, data_handle);
        let response = fetch(self.http.as_ref(), &url, token).await?;
        let bytes = response.body.len() as u64;
        expect_success(&response, &url)?;
        debug!(data_handle, bytes, layer = %self.layer, "blob downloaded");
        Ok((response.body, bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::MockHttpClient;
    use crate::error::ErrorCode;

    const LOOKUP_BODY: &str = r#"[{"api":"blob","version":"v1","baseUrl":"http://blob.test/v1"}]"#;

    fn blob(mock: Arc<MockHttpClient>) -> BlobApi<MockHttpClient> {
        let lookup = Arc::new(ApiLookup::new(
            mock.clone(),
            "http://lookup.test/lookup/v1",
            "catalog-a",
        ));
        BlobApi::new(mock, lookup, "layer-b")
    }

    #[tokio::test]
    async fn test_blob_download() {
        let mock = Arc::new(MockHttpClient::new());
        mock.push_ok(200, LOOKUP_BODY);
        mock.push_ok(200, "tile-bytes");
        let api = blob(mock.clone());
        let token = CancellationToken::new();

        let (payload, bytes) = api.data("handle-1", &token).await.unwrap();
        assert_eq!(payload, Bytes::from_static(b"tile-bytes"));
        assert_eq!(bytes, 10);
        assert_eq!(
            mock.requests().last().unwrap(),
            "http://blob.test/v1/layers/layer-b/data/handle-1"
        );
    }

    #[tokio::test]
    async fn test_blob_missing_is_not_found() {
        let mock = Arc::new(MockHttpClient::new());
        mock.push_ok(200, LOOKUP_BODY);
        mock.push_ok(404, "");
        let api = blob(mock);
        let token = CancellationToken::new();

        let err = api.data("absent", &token).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::NotFound);
    }
}
