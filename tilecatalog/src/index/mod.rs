//! Packed quad-tree index: the binary mapping from tiles to data handles.
//!
//! The backend answers tile-key queries with a quad-tree response: one
//! root tile, its descendants within a fixed depth, and a few ancestors,
//! each carrying an optional data handle and catalog version. The
//! [`QuadTreeIndex`] stores that response as a single binary buffer laid
//! out for random lookup, so the same bytes serve as the in-memory form,
//! the network payload, and the on-disk cache record. Lookups binary
//! search the serialized entry tables directly; nothing is deserialized
//! up front.
//!
//! [`QuadTreeResponse`] is the decoded JSON form of the same response,
//! used only as an intermediate step between the wire and
//! [`QuadTreeIndex::build`].

mod decoded;
mod quadtree;

pub use decoded::{ParentQuad, QuadTreeResponse, SubQuad};
pub use quadtree::{IndexError, IndexNode, QuadTreeIndex, TileEntry};
