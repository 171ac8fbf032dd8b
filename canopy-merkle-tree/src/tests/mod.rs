//! Test fixtures shared across the suite.
//!
//! The 8-leaf reference tree (first 2 bytes of each node):
//!
//! ```text
//! +--------------------------------------------------+
//! |                       89a0                       |
//! |           ba94                    633b           |
//! |     cb59        0094        bd50        fa67     |
//! |  0000  0100  0200  0300  0400  0500  0600  0700  |
//! +--------------------------------------------------+
//! ```


use canopy_layer_cache::{CacheWriter, CachingPolicy, LayerFactory, Node, NODE_SIZE};

/// Leaf `i`: u64 little-endian, zero-padded to [`NODE_SIZE`].
pub(crate) fn leaf(i: u64) -> Node {
    let mut node = vec![0u8; NODE_SIZE];
    node[..8].copy_from_slice(&i.to_le_bytes());
    node
}

/// A toy hash: concatenate the children, full-size children first truncated
/// to their leading byte. Makes padding visible in the root.
pub(crate) fn concat_leaves(left: &[u8], right: &[u8]) -> Node {
    let left = if left.len() == NODE_SIZE {
        &left[..1]
    } else {
        left
    };
    let right = if right.len() == NODE_SIZE {
        &right[..1]
    } else {
        right
    };
    let mut out = left.to_vec();
    out.extend_from_slice(right);
    out
}

/// A cache writer over in-memory layers for all heights.
pub(crate) fn mem_cache_all_layers() -> CacheWriter {
    CacheWriter::new(CachingPolicy::MinHeight(0), LayerFactory::Slice)
}

/// A cache writer over in-memory layers for exactly the given heights.
pub(crate) fn mem_cache_layers(heights: impl IntoIterator<Item = u32>) -> CacheWriter {
    CacheWriter::new(
        CachingPolicy::specific_layers(heights),
        LayerFactory::Slice,
    )
}
