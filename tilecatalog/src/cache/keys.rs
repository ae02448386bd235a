//! Deterministic cache key derivation.

use crate::tile::TileKey;

/// Derives cache keys for one `(catalog, layer)` binding.
///
/// Key stability is part of the contract with the cache store: records
/// written by one process are read back by the next, so the templates
/// never change shape. The kind tag at the end keeps prefix removal
/// scoped to a single record kind.
#[derive(Debug, Clone)]
pub struct CacheKeyNamer {
    catalog: String,
    layer: String,
}

impl CacheKeyNamer {
    /// Creates a namer for the given catalog and layer.
    pub fn new(catalog: impl Into<String>, layer: impl Into<String>) -> Self {
        Self {
            catalog: catalog.into(),
            layer: layer.into(),
        }
    }

    /// Key of a partition metadata record.
    pub fn partition_key(&self, partition_id: &str, version: u64) -> String {
        format!(
            "{}::{}::{}::{}::partition",
            self.catalog, self.layer, partition_id, version
        )
    }

    /// Key of a blob payload record.
    pub fn data_key(&self, data_handle: &str) -> String {
        format!("{}::{}::{}::Data", self.catalog, self.layer, data_handle)
    }

    /// Key of a packed quad-tree record.
    pub fn quadtree_key(&self, root: TileKey, version: u64, depth: u8) -> String {
        format!(
            "{}::{}::{}::{}::{}::quadtree",
            self.catalog,
            self.layer,
            root.to_here_tile(),
            version,
            depth
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn namer() -> CacheKeyNamer {
        CacheKeyNamer::new("catalog-a", "layer-b")
    }

    #[test]
    fn test_partition_key_template() {
        assert_eq!(
            namer().partition_key("269", 108),
            "catalog-a::layer-b::269::108::partition"
        );
    }

    #[test]
    fn test_data_key_template() {
        assert_eq!(
            namer().data_key("4eed6ed1-0d32-43b9-ae79-043cb4256432"),
            "catalog-a::layer-b::4eed6ed1-0d32-43b9-ae79-043cb4256432::Data"
        );
    }

    #[test]
    fn test_quadtree_key_template() {
        let root = TileKey::from_here_tile(92_259).unwrap();
        assert_eq!(
            namer().quadtree_key(root, 108, 4),
            "catalog-a::layer-b::92259::108::4::quadtree"
        );
    }

    #[test]
    fn test_keys_injective_across_fields_and_kinds() {
        let n = namer();
        let other = CacheKeyNamer::new("catalog-z", "layer-b");
        let root = TileKey::from_here_tile(92_259).unwrap();
        let keys: Vec<String> = vec![
            n.partition_key("269", 108),
            n.partition_key("269", 109),
            n.partition_key("270", 108),
            n.data_key("269"),
            n.quadtree_key(root, 108, 4),
            n.quadtree_key(root, 108, 3),
            n.quadtree_key(root, 107, 4),
            other.partition_key("269", 108),
        ];
        let unique: HashSet<&String> = keys.iter().collect();
        assert_eq!(unique.len(), keys.len());
    }
}
