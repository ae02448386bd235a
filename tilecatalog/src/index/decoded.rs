//! Decoded JSON form of a quad-tree response.

use super::IndexNode;
use crate::tile::TileKey;
use serde::Deserialize;
use tracing::warn;

/// Quad-tree response as decoded from the query API.
///
/// This is an intermediate form only: it is converted into
/// [`IndexNode`]s and packed immediately after decoding.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuadTreeResponse {
    /// Descendants of the requested root, within the requested depth.
    #[serde(default)]
    pub sub_quads: Vec<SubQuad>,
    /// Ancestors of the requested root.
    #[serde(default)]
    pub parent_quads: Vec<ParentQuad>,
}

/// One descendant entry, addressed relative to the requested root.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubQuad {
    /// Decimal sub-quadkey relative to the root (`"1"` is the root).
    pub sub_quad_key: String,
    /// Catalog version the tile last changed at.
    #[serde(default)]
    pub version: Option<u64>,
    /// Blob storage handle for the tile payload.
    #[serde(default)]
    pub data_handle: Option<String>,
}

/// One ancestor entry, addressed by absolute here-tile.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParentQuad {
    /// Decimal here-tile of the ancestor.
    pub partition: String,
    /// Catalog version the tile last changed at.
    #[serde(default)]
    pub version: Option<u64>,
    /// Blob storage handle for the tile payload.
    #[serde(default)]
    pub data_handle: Option<String>,
}

impl QuadTreeResponse {
    /// Resolves the response into absolute index nodes under `root`.
    ///
    /// Entries whose keys fail to parse are skipped with a warning
    /// rather than failing the whole response.
    pub fn into_nodes(self, root: TileKey) -> Vec<IndexNode> {
        let mut nodes = Vec::with_capacity(self.sub_quads.len() + self.parent_quads.len());
        for sub in self.sub_quads {
            let parsed = sub
                .sub_quad_key
                .parse::<u16>()
                .ok()
                .and_then(|key| root.subkey_to_absolute(key));
            match parsed {
                Some(tile_key) => nodes.push(IndexNode {
                    tile_key,
                    data_handle: sub.data_handle,
                    version: sub.version,
                }),
                None => warn!(sub_quad_key = %sub.sub_quad_key, "skipping unparseable sub quad"),
            }
        }
        for parent in self.parent_quads {
            match TileKey::from_here_tile_str(&parent.partition) {
                Some(tile_key) => nodes.push(IndexNode {
                    tile_key,
                    data_handle: parent.data_handle,
                    version: parent.version,
                }),
                None => warn!(partition = %parent.partition, "skipping unparseable parent quad"),
            }
        }
        nodes
    }
}
