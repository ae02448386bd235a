//! Tile addressing for the global quadtree.
//!
//! A [`TileKey`] names one node of the quadtree covering the globe:
//! level 0 is the single root tile, and every tile at level `n` splits
//! into four children at level `n + 1`. Tiles are addressed either by
//! `(level, row, col)` or by their decimal "here-tile" code, the form
//! used in backend URLs and cache keys.

mod key;

pub use key::{TileKey, MAX_LEVEL};
