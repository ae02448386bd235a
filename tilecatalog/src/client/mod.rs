//! Backend API clients.
//!
//! All network access goes through the [`AsyncHttpClient`] abstraction
//! so tests can substitute mock transports. Concrete endpoints are
//! resolved at runtime by [`ApiLookup`], which maps logical service
//! names (`metadata`, `query`, `blob`) to base URLs.

mod blob;
mod http;
mod lookup;
mod metadata;
mod models;
mod query;

pub use blob::BlobApi;
pub use http::{AsyncHttpClient, HttpResponse, ReqwestClient};
pub use lookup::{ApiLookup, DEFAULT_LOOKUP_URL};
pub use metadata::MetadataApi;
pub use models::{Api, Partition, PartitionsResponse, VersionResponse};
pub use query::QueryApi;

#[cfg(test)]
pub(crate) use http::tests::MockHttpClient;

use crate::error::ApiError;
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;

/// Issues a GET racing the cancellation token.
///
/// Cancellation drops the in-flight request and resolves to
/// [`ApiError::cancelled`]; a response that wins the race is delivered
/// as-is.
pub(crate) async fn fetch<C: AsyncHttpClient>(
    http: &C,
    url: &str,
    token: &CancellationToken,
) -> Result<HttpResponse, ApiError> {
    if token.is_cancelled() {
        return Err(ApiError::cancelled());
    }
    tokio::select! {
        _ = token.cancelled() => Err(ApiError::cancelled()),
        response = http.get(url) => response,
    }
}

/// Maps a non-success status to the matching [`ApiError`].
pub(crate) fn expect_success(response: &HttpResponse, url: &str) -> Result<(), ApiError> {
    if response.is_success() {
        Ok(())
    } else {
        Err(ApiError::from_status(response.status, url))
    }
}

/// Decodes a JSON response body, mapping failures to the parse error.
pub(crate) fn decode_json<T: DeserializeOwned>(body: &[u8]) -> Result<T, ApiError> {
    serde_json::from_slice(body).map_err(|_| ApiError::parse_failure())
}
