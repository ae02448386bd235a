//! Read-only packed quad-tree buffer with binary-search lookup.

use crate::tile::{TileKey, MAX_LEVEL};
use bytes::Bytes;

/// Fixed header: root here-tile (u64), depth (u8), parent count (u8),
/// sub-entry count (u16), all little-endian.
const HEADER_LEN: usize = 12;
/// Sub entry: sub-quadkey (u16) + tag offset (u16).
const SUB_ENTRY_LEN: usize = 4;
/// Parent entry: absolute here-tile (u64) + tag offset (u32), packed.
const PARENT_ENTRY_LEN: usize = 12;

/// Tag carries a catalog version (u64 follows the flags byte).
const FLAG_VERSION: u8 = 0x01;
/// Reserved checksum flag. The format defines no payload for it here;
/// tags carrying it decode exactly like tags without it.
#[allow(dead_code)]
const FLAG_CRC: u8 = 0x02;
/// Tag carries a NUL-terminated ASCII data handle.
const FLAG_DATA_HANDLE: u8 = 0x08;

/// Error raised when a buffer does not hold a valid packed quad-tree.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IndexError {
    /// Truncation, counts exceeding the buffer, unsorted entry tables,
    /// or a tag offset outside the data section.
    #[error("malformed quad-tree blob: {0}")]
    BadLayout(&'static str),
}

/// Data resolved for one tile of a quad-tree index.
///
/// At least one of the fields is present; tags carrying neither a
/// version nor a handle are reported as absent by [`QuadTreeIndex::find`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileEntry {
    /// Handle for retrieving the tile's payload from blob storage.
    pub data_handle: Option<String>,
    /// Catalog version the tile last changed at.
    pub version: Option<u64>,
}

/// One decoded node of a quad-tree response, input to
/// [`QuadTreeIndex::build`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexNode {
    /// Absolute key of the tile this node describes.
    pub tile_key: TileKey,
    /// Handle for the tile's payload, if one exists.
    pub data_handle: Option<String>,
    /// Catalog version the tile last changed at.
    pub version: Option<u64>,
}

/// Packed, immutable quad-tree index over one root tile.
///
/// The buffer holds a header, a sub-entry table (descendants of the
/// root within `depth` levels, sorted by sub-quadkey), a parent-entry
/// table (ancestors, sorted by here-tile), and a data section of
/// variable-length tags. [`find`](Self::find) runs a binary search over
/// the serialized tables without allocating.
///
/// The byte layout is stable across library versions: the same buffer
/// is written to and read back from the cache.
#[derive(Debug, Clone)]
pub struct QuadTreeIndex {
    data: Bytes,
    root: TileKey,
    depth: u8,
    subkey_count: usize,
    parent_count: usize,
    data_offset: usize,
}

impl QuadTreeIndex {
    /// Validates and wraps a packed quad-tree buffer.
    ///
    /// Checks header counts against the buffer length, strict
    /// monotonicity of both entry tables, and that every tag offset
    /// falls inside the data section. Tags themselves are not parsed
    /// until looked up.
    pub fn from_blob(data: Bytes) -> Result<Self, IndexError> {
        if data.len() < HEADER_LEN {
            return Err(IndexError::BadLayout("truncated header"));
        }
        let root_value = u64_at(&data, 0);
        let depth = data[8];
        let parent_count = data[9] as usize;
        let subkey_count = u16_at(&data, 10) as usize;

        let root = TileKey::from_here_tile(root_value)
            .ok_or(IndexError::BadLayout("invalid root tile key"))?;
        if root.level() + u32::from(depth) > MAX_LEVEL {
            return Err(IndexError::BadLayout("root level plus depth out of range"));
        }

        let data_offset =
            HEADER_LEN + subkey_count * SUB_ENTRY_LEN + parent_count * PARENT_ENTRY_LEN;
        if data_offset > data.len() {
            return Err(IndexError::BadLayout("entry tables exceed buffer"));
        }
        let tag_len = data.len() - data_offset;

        let index = Self {
            data,
            root,
            depth,
            subkey_count,
            parent_count,
            data_offset,
        };

        let mut previous: Option<u16> = None;
        for i in 0..index.subkey_count {
            let (sub_quadkey, tag_offset) = index.sub_entry_at(i);
            if previous.is_some_and(|prev| prev >= sub_quadkey) {
                return Err(IndexError::BadLayout("sub entries not strictly ascending"));
            }
            previous = Some(sub_quadkey);
            if tag_offset >= tag_len {
                return Err(IndexError::BadLayout("sub tag offset out of range"));
            }
        }

        let mut previous: Option<u64> = None;
        for i in 0..index.parent_count {
            let (key, tag_offset) = index.parent_entry_at(i);
            if previous.is_some_and(|prev| prev >= key) {
                return Err(IndexError::BadLayout(
                    "parent entries not strictly ascending",
                ));
            }
            previous = Some(key);
            if tag_offset as usize >= tag_len {
                return Err(IndexError::BadLayout("parent tag offset out of range"));
            }
        }

        Ok(index)
    }

    /// Builds a packed index from decoded quad-tree nodes.
    ///
    /// Nodes are split into sub entries (descendants of `root` within
    /// `depth`, the root itself included) and parent entries
    /// (ancestors); anything outside the covered set is dropped. Each
    /// table is sorted and tags are serialized into the data section
    /// with their offsets rewritten to the packed layout.
    pub fn build(root: TileKey, depth: u8, nodes: Vec<IndexNode>) -> Self {
        let mut subs: Vec<(u16, IndexNode)> = Vec::new();
        let mut parents: Vec<(u64, IndexNode)> = Vec::new();
        for node in nodes {
            let level = node.tile_key.level();
            if level >= root.level() && level - root.level() <= u32::from(depth) {
                let distance = level - root.level();
                if node.tile_key.changed_level_by(-(distance as i32)) == root {
                    subs.push((node.tile_key.sub_quadkey_at(distance), node));
                    continue;
                }
            }
            if node.tile_key.is_ancestor_of(&root) {
                parents.push((node.tile_key.to_here_tile(), node));
            }
        }
        subs.sort_by_key(|(sub, _)| *sub);
        subs.dedup_by_key(|(sub, _)| *sub);
        parents.sort_by_key(|(key, _)| *key);
        parents.dedup_by_key(|(key, _)| *key);

        let mut tags: Vec<u8> = Vec::new();
        let sub_offsets: Vec<usize> = subs
            .iter()
            .map(|(_, node)| append_tag(&mut tags, node))
            .collect();
        let parent_offsets: Vec<usize> = parents
            .iter()
            .map(|(_, node)| append_tag(&mut tags, node))
            .collect();
        debug_assert!(tags.len() <= u16::MAX as usize, "sub tag section overflow");

        let data_offset =
            HEADER_LEN + subs.len() * SUB_ENTRY_LEN + parents.len() * PARENT_ENTRY_LEN;
        let mut buffer = Vec::with_capacity(data_offset + tags.len());
        buffer.extend_from_slice(&root.to_here_tile().to_le_bytes());
        buffer.push(depth);
        buffer.push(parents.len() as u8);
        buffer.extend_from_slice(&(subs.len() as u16).to_le_bytes());
        for ((sub_quadkey, _), offset) in subs.iter().zip(&sub_offsets) {
            buffer.extend_from_slice(&sub_quadkey.to_le_bytes());
            buffer.extend_from_slice(&(*offset as u16).to_le_bytes());
        }
        for ((key, _), offset) in parents.iter().zip(&parent_offsets) {
            buffer.extend_from_slice(&key.to_le_bytes());
            buffer.extend_from_slice(&(*offset as u32).to_le_bytes());
        }
        buffer.extend_from_slice(&tags);

        Self {
            data: Bytes::from(buffer),
            root,
            depth,
            subkey_count: subs.len(),
            parent_count: parents.len(),
            data_offset,
        }
    }

    /// Root tile this index is anchored at.
    pub fn root(&self) -> TileKey {
        self.root
    }

    /// Number of descendant levels covered below the root.
    pub fn depth(&self) -> u8 {
        self.depth
    }

    /// The packed buffer, suitable for caching or transport.
    pub fn raw(&self) -> &[u8] {
        &self.data
    }

    /// Cheap owned handle to the packed buffer.
    pub fn to_bytes(&self) -> Bytes {
        self.data.clone()
    }

    /// Looks up a tile within the covered set.
    ///
    /// Descendants of the root within `depth` levels are resolved
    /// through the sub-entry table, ancestors through the parent-entry
    /// table. Returns `None` for tiles outside the coverage and for
    /// entries whose tag resolves to neither a version nor a handle.
    pub fn find(&self, tile: TileKey) -> Option<TileEntry> {
        if tile.level() >= self.root.level() {
            let distance = tile.level() - self.root.level();
            if distance > u32::from(self.depth) {
                return None;
            }
            if tile.changed_level_by(-(distance as i32)) != self.root {
                return None;
            }
            let target = tile.sub_quadkey_at(distance);
            let i = self.search_sub(target)?;
            let (_, tag_offset) = self.sub_entry_at(i);
            self.decode_tag(tag_offset)
        } else {
            let target = tile.to_here_tile();
            let i = self.search_parent(target)?;
            let (_, tag_offset) = self.parent_entry_at(i);
            self.decode_tag(tag_offset as usize)
        }
    }

    /// Iterates the sub-entry table as absolute tiles with decoded tags.
    ///
    /// Entries whose tag decodes to nothing are skipped.
    pub fn sub_entries(&self) -> impl Iterator<Item = (TileKey, TileEntry)> + '_ {
        (0..self.subkey_count).filter_map(move |i| {
            let (sub_quadkey, tag_offset) = self.sub_entry_at(i);
            let tile = self.root.subkey_to_absolute(sub_quadkey)?;
            let entry = self.decode_tag(tag_offset)?;
            Some((tile, entry))
        })
    }

    fn sub_entry_at(&self, i: usize) -> (u16, usize) {
        let pos = HEADER_LEN + i * SUB_ENTRY_LEN;
        (u16_at(&self.data, pos), u16_at(&self.data, pos + 2) as usize)
    }

    fn parent_entry_at(&self, i: usize) -> (u64, u32) {
        let pos = HEADER_LEN + self.subkey_count * SUB_ENTRY_LEN + i * PARENT_ENTRY_LEN;
        (u64_at(&self.data, pos), u32_at(&self.data, pos + 8))
    }

    fn search_sub(&self, target: u16) -> Option<usize> {
        let mut lo = 0usize;
        let mut hi = self.subkey_count;
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            let (sub_quadkey, _) = self.sub_entry_at(mid);
            match sub_quadkey.cmp(&target) {
                std::cmp::Ordering::Equal => return Some(mid),
                std::cmp::Ordering::Less => lo = mid + 1,
                std::cmp::Ordering::Greater => hi = mid,
            }
        }
        None
    }

    fn search_parent(&self, target: u64) -> Option<usize> {
        let mut lo = 0usize;
        let mut hi = self.parent_count;
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            let (key, _) = self.parent_entry_at(mid);
            match key.cmp(&target) {
                std::cmp::Ordering::Equal => return Some(mid),
                std::cmp::Ordering::Less => lo = mid + 1,
                std::cmp::Ordering::Greater => hi = mid,
            }
        }
        None
    }

    /// Decodes the tag at `offset` within the data section.
    ///
    /// Truncated tags decode to `None` rather than erroring; the
    /// reserved checksum flag contributes no bytes and is ignored.
    fn decode_tag(&self, offset: usize) -> Option<TileEntry> {
        let tags = &self.data[self.data_offset..];
        let mut pos = offset;
        let flags = *tags.get(pos)?;
        pos += 1;
        let version = if flags & FLAG_VERSION != 0 {
            let raw: [u8; 8] = tags.get(pos..pos + 8)?.try_into().ok()?;
            pos += 8;
            Some(u64::from_le_bytes(raw))
        } else {
            None
        };
        let data_handle = if flags & FLAG_DATA_HANDLE != 0 {
            let rest = tags.get(pos..)?;
            let nul = rest.iter().position(|&b| b == 0)?;
            Some(std::str::from_utf8(&rest[..nul]).ok()?.to_string())
        } else {
            None
        };
        if version.is_none() && data_handle.is_none() {
            return None;
        }
        Some(TileEntry {
            data_handle,
            version,
        })
    }
}

fn append_tag(tags: &mut Vec<u8>, node: &IndexNode) -> usize {
    let offset = tags.len();
    let mut flags = 0u8;
    if node.version.is_some() {
        flags |= FLAG_VERSION;
    }
    if node.data_handle.is_some() {
        flags |= FLAG_DATA_HANDLE;
    }
    tags.push(flags);
    if let Some(version) = node.version {
        tags.extend_from_slice(&version.to_le_bytes());
    }
    if let Some(handle) = &node.data_handle {
        tags.extend_from_slice(handle.as_bytes());
        tags.push(0);
    }
    offset
}

fn u16_at(data: &[u8], pos: usize) -> u16 {
    u16::from_le_bytes([data[pos], data[pos + 1]])
}

fn u32_at(data: &[u8], pos: usize) -> u32 {
    u32::from_le_bytes([data[pos], data[pos + 1], data[pos + 2], data[pos + 3]])
}

fn u64_at(data: &[u8], pos: usize) -> u64 {
    let mut raw = [0u8; 8];
    raw.copy_from_slice(&data[pos..pos + 8]);
    u64::from_le_bytes(raw)
}
