//! HTTP client abstraction for testability.

use crate::error::ApiError;
use bytes::Bytes;
use std::future::Future;
use tracing::{debug, trace, warn};

/// An HTTP response delivered to the API clients.
///
/// Non-success statuses are returned as responses, not errors: each API
/// client decides how a status maps onto the error model.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body, possibly empty.
    pub body: Bytes,
}

impl HttpResponse {
    /// Returns true for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Trait for asynchronous HTTP GET transports.
///
/// Allows dependency injection of mock transports in tests. Transport
/// failures (connect, timeout, body read) surface as
/// [`crate::error::ErrorCode::Network`] errors; any received status is
/// a successful `Ok` response.
pub trait AsyncHttpClient: Send + Sync {
    /// Performs an async HTTP GET request.
    fn get(&self, url: &str) -> impl Future<Output = Result<HttpResponse, ApiError>> + Send;
}

/// Default User-Agent for backend requests.
const DEFAULT_USER_AGENT: &str = concat!("tilecatalog/", env!("CARGO_PKG_VERSION"));

/// Real HTTP client backed by reqwest.
///
/// Tuned for bulk catalog reads: pooled keep-alive connections and TCP
/// nodelay, since prefetch fans dozens of small requests at the same
/// hosts.
#[derive(Clone)]
pub struct ReqwestClient {
    client: reqwest::Client,
}

impl ReqwestClient {
    /// Creates a client with the default 30 second timeout.
    pub fn new() -> Result<Self, ApiError> {
        Self::with_timeout(30)
    }

    /// Creates a client with a custom request timeout.
    pub fn with_timeout(timeout_secs: u64) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .user_agent(DEFAULT_USER_AGENT)
            .pool_max_idle_per_host(64)
            .pool_idle_timeout(std::time::Duration::from_secs(90))
            .tcp_keepalive(std::time::Duration::from_secs(30))
            .tcp_nodelay(true)
            .build()
            .map_err(|e| ApiError::network(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

impl AsyncHttpClient for ReqwestClient {
    async fn get(&self, url: &str) -> Result<HttpResponse, ApiError> {
        trace!(url, "HTTP GET request starting");
        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!(
                    url,
                    error = %e,
                    is_connect = e.is_connect(),
                    is_timeout = e.is_timeout(),
                    "HTTP request failed"
                );
                return Err(ApiError::network(format!("Request failed: {}", e)));
            }
        };
        let status = response.status().as_u16();
        debug!(url, status, "HTTP response received");
        let body = response
            .bytes()
            .await
            .map_err(|e| ApiError::network(format!("Failed to read response: {}", e)))?;
        trace!(url, bytes = body.len(), "HTTP response body read");
        Ok(HttpResponse { status, body })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Mock transport replaying queued responses in order.
    ///
    /// Requests past the end of the queue answer 404 with an empty
    /// body. Every requested URL is recorded.
    pub(crate) struct MockHttpClient {
        requests: Mutex<Vec<String>>,
        responses: Mutex<VecDeque<Result<HttpResponse, ApiError>>>,
    }

    impl MockHttpClient {
        pub(crate) fn new() -> Self {
            Self {
                requests: Mutex::new(Vec::new()),
                responses: Mutex::new(VecDeque::new()),
            }
        }

        pub(crate) fn push_ok(&self, status: u16, body: &str) {
            self.responses.lock().unwrap().push_back(Ok(HttpResponse {
                status,
                body: Bytes::from(body.to_string()),
            }));
        }

        pub(crate) fn push_err(&self, error: ApiError) {
            self.responses.lock().unwrap().push_back(Err(error));
        }

        pub(crate) fn requests(&self) -> Vec<String> {
            self.requests.lock().unwrap().clone()
        }
    }

    impl AsyncHttpClient for MockHttpClient {
        async fn get(&self, url: &str) -> Result<HttpResponse, ApiError> {
            self.requests.lock().unwrap().push(url.to_string());
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| {
                    Ok(HttpResponse {
                        status: 404,
                        body: Bytes::new(),
                    })
                })
        }
    }

    #[tokio::test]
    async fn test_mock_client_replays_in_order() {
        let mock = MockHttpClient::new();
        mock.push_ok(200, "first");
        mock.push_ok(500, "second");

        let first = mock.get("http://example.com/a").await.unwrap();
        assert_eq!(first.status, 200);
        assert!(first.is_success());

        let second = mock.get("http://example.com/b").await.unwrap();
        assert_eq!(second.status, 500);
        assert!(!second.is_success());

        assert_eq!(mock.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_mock_client_defaults_to_404() {
        let mock = MockHttpClient::new();
        let response = mock.get("http://example.com").await.unwrap();
        assert_eq!(response.status, 404);
        assert!(response.body.is_empty());
    }

    #[tokio::test]
    async fn test_mock_client_transport_error() {
        let mock = MockHttpClient::new();
        mock.push_err(ApiError::network("connection refused"));
        assert!(mock.get("http://example.com").await.is_err());
    }
}
