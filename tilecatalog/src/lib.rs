//! tilecatalog - client-side read layer for versioned tile catalogs
//!
//! This library reads layer content from a versioned, tile-addressed
//! geospatial catalog service: it fetches blobs keyed by partition ID
//! or hierarchical tile key, caches them locally, and offers bulk
//! prefetch and cache pinning. Tile-to-blob mappings travel as packed
//! quad-tree indexes that double as cache records.
//!
//! # High-Level API
//!
//! Most use cases go through the [`layer::LayerClient`] façade:
//!
//! ```ignore
//! use tilecatalog::layer::LayerClient;
//! use tilecatalog::request::TileRequest;
//! use tilecatalog::settings::ClientSettings;
//! use tilecatalog::tile::TileKey;
//!
//! let client = LayerClient::new("my-catalog", "imagery", ClientSettings::new())?;
//! let tile = TileKey::from_here_tile_str("23618364").unwrap();
//! let payload = client
//!     .get_tile(TileRequest::new().with_tile_key(tile), None)
//!     .wait()
//!     .await?;
//! ```

pub mod cache;
pub mod client;
pub mod error;
pub mod future;
pub mod index;
pub mod layer;
pub mod prefetch;
pub mod repository;
pub mod request;
pub mod settings;
pub mod tile;

/// Version of the tilecatalog library.
///
/// Defined in `Cargo.toml` and injected at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_tile_module_is_accessible() {
        let tile = tile::TileKey::from_here_tile(92_259).unwrap();
        assert_eq!(tile.level(), 8);
    }
}
