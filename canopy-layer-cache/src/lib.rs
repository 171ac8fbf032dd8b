//! Layer read-writers and partial-layer caches for streaming Merkle trees.
//!
//! A *layer* is an append-only tape of fixed-size nodes with seek-and-read
//! access. A *cache* maps tree heights to layers, deciding which heights to
//! materialize through an injected [`CachingPolicy`] and creating the backing
//! layers through an injected [`LayerFactory`].
//!
//! # Core types
//!
//! - [`LayerReader`] / [`LayerWriter`] / [`LayerReadWriter`] — the layer
//!   contract.
//! - [`SliceLayer`] — in-memory layer for tests and ephemeral caches.
//! - [`FileLayer`] — node-aligned random I/O over a flat file.
//! - [`GroupLayer`] — read-only virtual concatenation of several layers.
//! - [`CacheWriter`] / [`CacheReader`] — the cache lifecycle: write while a
//!   tree streams through, then flush, validate and read.
//! - [`merge`] — combine independently built caches into one reader.

mod error;
mod factory;
mod group;
mod layer;
mod merge;
mod policy;
mod reader;
pub mod readwriters;
mod writer;

#[cfg(test)]
mod tests;

use sha2::{Digest, Sha256};

pub use error::{Error, Result};
pub use factory::LayerFactory;
pub use group::GroupLayer;
pub use layer::{LayerReader, LayerReadWriter, LayerWriter};
pub use merge::merge;
pub use policy::CachingPolicy;
pub use reader::CacheReader;
pub use readwriters::{FileLayer, SliceLayer};
pub use writer::CacheWriter;

/// Size in bytes of a single stored node. Layers hold back-to-back records of
/// exactly this size.
pub const NODE_SIZE: usize = 32;

/// Value substituted for a virtual right sibling past the actual tree width,
/// and for missing base-layer entries. Leaf content must not collide with it.
pub const PADDING_VALUE: [u8; NODE_SIZE] = [0u8; NODE_SIZE];

/// A node value. Hash functions may produce nodes shorter than [`NODE_SIZE`];
/// layers always store [`NODE_SIZE`]-byte records.
pub type Node = Vec<u8>;

/// A parent hash function over two sibling nodes.
pub type HashFunc = fn(left: &[u8], right: &[u8]) -> Node;

/// The default parent function: SHA-256 over `left || right`.
pub fn sha256_parent(left: &[u8], right: &[u8]) -> Node {
    let mut hasher = Sha256::new();
    hasher.update(left);
    hasher.update(right);
    hasher.finalize().to_vec()
}

/// Height of the root of a tree with `width` leaves: ⌈log₂(width)⌉.
pub fn root_height_from_width(width: u64) -> u32 {
    width.next_power_of_two().trailing_zeros()
}

#[cfg(test)]
mod lib_tests {
    use super::*;

    #[test]
    fn test_root_height_from_width() {
        assert_eq!(root_height_from_width(1), 0);
        assert_eq!(root_height_from_width(2), 1);
        assert_eq!(root_height_from_width(3), 2);
        assert_eq!(root_height_from_width(4), 2);
        assert_eq!(root_height_from_width(7), 3);
        assert_eq!(root_height_from_width(8), 3);
        assert_eq!(root_height_from_width(10), 4);
    }

    #[test]
    fn test_sha256_parent_is_concat_hash() {
        let left = [1u8; NODE_SIZE];
        let right = [2u8; NODE_SIZE];
        let parent = sha256_parent(&left, &right);

        let mut concat = left.to_vec();
        concat.extend_from_slice(&right);
        let expected = Sha256::digest(&concat).to_vec();
        assert_eq!(parent, expected);
    }
}
