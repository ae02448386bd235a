//! Shared test support: a URL-routed mock HTTP transport and response
//! builders for the backend APIs.

#![allow(dead_code)]

use bytes::Bytes;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tilecatalog::cache::{CacheStore, EvictionGuard, InMemoryCacheStore, ProtectionRegistry};
use tilecatalog::client::{AsyncHttpClient, HttpResponse};
use tilecatalog::error::ApiError;
use tilecatalog::layer::LayerClient;
use tilecatalog::settings::ClientSettings;
use tilecatalog::tile::TileKey;

pub const CATALOG: &str = "catalog-a";
pub const LAYER: &str = "layer-b";
pub const LOOKUP_URL: &str = "http://lookup.test/lookup/v1";

#[derive(Clone)]
struct Route {
    pattern: String,
    status: u16,
    body: Bytes,
    delay: Option<Duration>,
}

/// Mock transport answering by URL substring match.
///
/// The first route whose pattern occurs in the requested URL wins;
/// unrouted URLs answer 404 with an empty body. Every request is
/// recorded for assertions.
pub struct RoutedHttpClient {
    routes: Mutex<Vec<Route>>,
    requests: Mutex<Vec<String>>,
}

impl RoutedHttpClient {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            routes: Mutex::new(Vec::new()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn route(&self, pattern: &str, status: u16, body: impl Into<Bytes>) {
        self.routes.lock().unwrap().push(Route {
            pattern: pattern.to_string(),
            status,
            body: body.into(),
            delay: None,
        });
    }

    pub fn route_with_delay(
        &self,
        pattern: &str,
        status: u16,
        body: impl Into<Bytes>,
        delay: Duration,
    ) {
        self.routes.lock().unwrap().push(Route {
            pattern: pattern.to_string(),
            status,
            body: body.into(),
            delay: Some(delay),
        });
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self, pattern: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|url| url.contains(pattern))
            .count()
    }
}

impl AsyncHttpClient for RoutedHttpClient {
    async fn get(&self, url: &str) -> Result<HttpResponse, ApiError> {
        self.requests.lock().unwrap().push(url.to_string());
        let route = {
            let routes = self.routes.lock().unwrap();
            routes.iter().find(|route| url.contains(&route.pattern)).cloned()
        };
        match route {
            Some(route) => {
                if let Some(delay) = route.delay {
                    tokio::time::sleep(delay).await;
                }
                Ok(HttpResponse {
                    status: route.status,
                    body: route.body,
                })
            }
            None => Ok(HttpResponse {
                status: 404,
                body: Bytes::new(),
            }),
        }
    }
}

/// Everything a test needs to drive and observe one client.
pub struct TestHarness {
    pub client: LayerClient<RoutedHttpClient>,
    pub http: Arc<RoutedHttpClient>,
    pub cache: Arc<InMemoryCacheStore>,
    pub registry: Arc<ProtectionRegistry>,
}

/// Builds a client over the routed mock with an observable cache store
/// and protection registry.
pub fn harness(ttl: Option<Duration>) -> TestHarness {
    let http = RoutedHttpClient::new();
    http.route("/resources/", 200, lookup_body());
    let registry = Arc::new(ProtectionRegistry::new());
    let guard: Arc<dyn EvictionGuard> = registry.clone();
    let cache = Arc::new(InMemoryCacheStore::new(ttl).with_eviction_guard(guard));
    let store: Arc<dyn CacheStore> = cache.clone();
    let client = LayerClient::with_components(
        CATALOG,
        LAYER,
        ClientSettings::new().with_lookup_url(LOOKUP_URL),
        http.clone(),
        store,
        registry.clone(),
    );
    TestHarness {
        client,
        http,
        cache,
        registry,
    }
}

pub fn lookup_body() -> String {
    String::from(
        r#"[
            {"api":"metadata","version":"v1","baseUrl":"http://metadata.test/v1"},
            {"api":"query","version":"v1","baseUrl":"http://query.test/v1"},
            {"api":"blob","version":"v1","baseUrl":"http://blob.test/v1"}
        ]"#,
    )
}

pub fn version_body(version: u64) -> String {
    format!(r#"{{"version":{}}}"#, version)
}

pub fn partitions_body(partitions: &[(&str, u64, &str)]) -> String {
    let entries: Vec<String> = partitions
        .iter()
        .map(|(id, version, handle)| {
            format!(
                r#"{{"partition":"{}","version":{},"dataHandle":"{}"}}"#,
                id, version, handle
            )
        })
        .collect();
    format!(r#"{{"partitions":[{}]}}"#, entries.join(","))
}

/// Quad-tree response body with one sub entry per `(tile, handle)`,
/// each addressed relative to `root`.
pub fn quadtree_body(root: TileKey, version: u64, entries: &[(TileKey, &str)]) -> String {
    let subs: Vec<String> = entries
        .iter()
        .map(|(tile, handle)| {
            let sub_quadkey = tile.sub_quadkey_at(tile.level() - root.level());
            format!(
                r#"{{"subQuadKey":"{}","version":{},"dataHandle":"{}"}}"#,
                sub_quadkey, version, handle
            )
        })
        .collect();
    format!(r#"{{"subQuads":[{}],"parentQuads":[]}}"#, subs.join(","))
}

/// Cache key of a blob record, matching the client's key templates.
pub fn data_key(handle: &str) -> String {
    format!("{}::{}::{}::Data", CATALOG, LAYER, handle)
}

/// Cache key of a quad-tree record.
pub fn quadtree_key(root: TileKey, version: u64) -> String {
    format!(
        "{}::{}::{}::{}::4::quadtree",
        CATALOG,
        LAYER,
        root.to_here_tile(),
        version
    )
}

/// Cache key of a partition record.
pub fn partition_key(partition_id: &str, version: u64) -> String {
    format!(
        "{}::{}::{}::{}::partition",
        CATALOG, LAYER, partition_id, version
    )
}
