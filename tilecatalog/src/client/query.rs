//! Query API client: partition lists and quad-tree responses.

use super::models::{Partition, PartitionsResponse};
use super::{decode_json, expect_success, fetch, ApiLookup, AsyncHttpClient};
use crate::error::ApiError;
use crate::index::QuadTreeResponse;
use crate::tile::TileKey;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Client for the catalog query service of one layer.
pub struct QueryApi<C> {
    http: Arc<C>,
    lookup: Arc<ApiLookup<C>>,
    layer: String,
}

impl<C: AsyncHttpClient> QueryApi<C> {
    /// Creates a query client bound to a layer.
    pub fn new(http: Arc<C>, lookup: Arc<ApiLookup<C>>, layer: impl Into<String>) -> Self {
        Self {
            http,
            lookup,
            layer: layer.into(),
        }
    }

    /// Fetches metadata for the given partition IDs at a version.
    ///
    /// The backend accepts at most 100 IDs per call; batching to that
    /// limit is the caller's concern. IDs unknown to the catalog are
    /// absent from the result. Returns the resolved partitions and the
    /// response bytes transferred.
    pub async fn partitions(
        &self,
        ids: &[String],
        version: u64,
        token: &CancellationToken,
    ) -> Result<(Vec<Partition>, u64), ApiError> {
        let base = self.lookup.base_url("query", token).await?;
        let selectors: Vec<String> = ids.iter().map(|id| format!("partition={}", id)).collect();
        let url = format!(
            "{}/layers/{}/partitions?{}&version={}",
            base,
            self.layer,
            selectors.join("&"),
            version
        );
        let response = fetch(self.http.as_ref(), &url, token).await?;
        let bytes = response.body.len() as u64;
        expect_success(&response, &url)?;
        let decoded: PartitionsResponse = decode_json(&response.body)?;
        debug!(
            requested = ids.len(),
            resolved = decoded.partitions.len(),
            layer = %self.layer,
            "partition query resolved"
        );
        Ok((decoded.partitions, bytes))
    }

    /// Fetches the quad-tree rooted at `root` covering `depth` levels.
    ///
    /// Returns the decoded response and the response bytes transferred.
    pub async fn quadtree(
        &self,
        root: TileKey,
        depth: u8,
        version: u64,
        token: &CancellationToken,
    ) -> Result<(QuadTreeResponse, u64), ApiError> {
        let base = self.lookup.base_url("query", token).await?;
        let url = format!(
            "{}/layers/{}/quadkeys/{}/depths/{}?version={}",
            base,
            self.layer,
            root.to_here_tile(),
            depth,
            version
        );
        let response = fetch(self.http.as_ref(), &url, token).await?;
        let bytes = response.body.len() as u64;
        expect_success(&response, &url)?;
        let decoded: QuadTreeResponse = decode_json(&response.body)?;
        debug!(
            root = %root,
            depth,
            sub_quads = decoded.sub_quads.len(),
            parent_quads = decoded.parent_quads.len(),
            "quad-tree query resolved"
        );
        Ok((decoded, bytes))
    }
}
