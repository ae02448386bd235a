//! Client configuration.

use crate::client::DEFAULT_LOOKUP_URL;
use std::time::Duration;

/// Settings shared by every component of a layer client.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use tilecatalog::settings::ClientSettings;
///
/// let settings = ClientSettings::new()
///     .with_default_cache_expiration(Some(Duration::from_secs(3600)))
///     .with_prefetch_concurrency(16);
/// ```
#[derive(Debug, Clone)]
pub struct ClientSettings {
    lookup_url: String,
    default_cache_expiration: Option<Duration>,
    query_batch_size: usize,
    prefetch_concurrency: usize,
    http_timeout_secs: u64,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            lookup_url: DEFAULT_LOOKUP_URL.to_string(),
            default_cache_expiration: None,
            query_batch_size: 100,
            prefetch_concurrency: 8,
            http_timeout_secs: 30,
        }
    }
}

impl ClientSettings {
    /// Creates settings with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the API lookup service base URL.
    pub fn with_lookup_url(mut self, url: impl Into<String>) -> Self {
        self.lookup_url = url.into();
        self
    }

    /// Sets the default TTL applied to cache records.
    ///
    /// `None` keeps records until they are removed. Protected records
    /// outlive the TTL either way.
    pub fn with_default_cache_expiration(mut self, expiration: Option<Duration>) -> Self {
        self.default_cache_expiration = expiration;
        self
    }

    /// Sets the partition-ID batch size for metadata queries (capped at
    /// the backend limit of 100).
    pub fn with_query_batch_size(mut self, batch_size: usize) -> Self {
        self.query_batch_size = batch_size;
        self
    }

    /// Sets the bound on concurrent blob downloads during prefetch.
    pub fn with_prefetch_concurrency(mut self, concurrency: usize) -> Self {
        self.prefetch_concurrency = concurrency;
        self
    }

    /// Sets the HTTP request timeout in seconds.
    pub fn with_http_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.http_timeout_secs = timeout_secs;
        self
    }

    /// API lookup service base URL.
    pub fn lookup_url(&self) -> &str {
        &self.lookup_url
    }

    /// Default cache record TTL.
    pub fn default_cache_expiration(&self) -> Option<Duration> {
        self.default_cache_expiration
    }

    /// Partition-ID batch size for metadata queries.
    pub fn query_batch_size(&self) -> usize {
        self.query_batch_size
    }

    /// Bound on concurrent blob downloads during prefetch.
    pub fn prefetch_concurrency(&self) -> usize {
        self.prefetch_concurrency
    }

    /// HTTP request timeout in seconds.
    pub fn http_timeout_secs(&self) -> u64 {
        self.http_timeout_secs
    }
}
