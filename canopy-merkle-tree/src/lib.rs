//! Streaming Merkle tree with partial-layer caching and multi-leaf
//! membership proofs.
//!
//! The tree is built incrementally: leaves are appended one at a time, hashes
//! propagate upward through per-layer parked columns, and the whole
//! construction needs O(log n) memory — O(k·log n) when also proving k
//! leaves. Trees need not be balanced; virtual zero-valued padding stands in
//! for the missing right edge.
//!
//! # Core types
//!
//! - [`Tree`] / [`TreeBuilder`] — streaming construction (root, proof,
//!   cache teeing, parked-node snapshots).
//! - [`generate_proof`] — minimal multi-leaf proofs from a
//!   [`CacheReader`], recomputing uncached subtrees on the fly.
//! - [`validate_partial_tree`] — root reconstruction from sorted proven
//!   leaves and a linear proof stream;
//!   [`validate_partial_tree_with_parking_snapshots`] additionally recovers
//!   each leaf's construction-time parked columns.
//! - [`build_top`] — complete a merged cache up to the tree root.
//!
//! Everything is single-threaded cooperative: exclusive receivers, no
//! internal parallelism, no suspension points. Only file-backed layer
//! operations block on I/O.
//!
//! # Example
//!
//! ```
//! use canopy_merkle_tree::{generate_proof, validate_partial_tree, Tree, TreeBuilder};
//! use canopy_merkle_tree::{CacheWriter, CachingPolicy, LayerFactory};
//!
//! let proven = [4u64];
//! let cache = CacheWriter::new(CachingPolicy::MinHeight(0), LayerFactory::Slice);
//! let mut tree = TreeBuilder::new()
//!     .with_leaves_to_prove(&proven)
//!     .with_cache_writer(cache)
//!     .build();
//! for i in 0u64..8 {
//!     let mut leaf = vec![0u8; 32];
//!     leaf[..8].copy_from_slice(&i.to_le_bytes());
//!     tree.add_leaf(&leaf).unwrap();
//! }
//! let (root, proof) = tree.root_and_proof();
//!
//! let mut reader = tree.into_cache().into_reader().unwrap();
//! let (indices, leaves, regenerated) = generate_proof(&proven, &mut reader).unwrap();
//! assert_eq!(regenerated, proof);
//!
//! let valid = validate_partial_tree(
//!     &indices,
//!     &leaves,
//!     &proof,
//!     &root,
//!     canopy_merkle_tree::sha256_parent,
//! )
//! .unwrap();
//! assert!(valid);
//! ```

mod builder;
mod error;
mod iterators;
mod position;
mod proving;
mod rebuild;
mod tree;
mod validation;

#[cfg(test)]
mod tests;

pub use builder::TreeBuilder;
pub use error::{CacheError, Error, Result};
pub use position::Position;
pub use proving::{generate_proof, get_node};
pub use rebuild::build_top;
pub use tree::Tree;
pub use validation::{
    validate_partial_tree, validate_partial_tree_with_parking_snapshots, ParkingSnapshot,
};

pub use canopy_layer_cache::{
    merge, root_height_from_width, sha256_parent, CacheReader, CacheWriter, CachingPolicy,
    FileLayer, GroupLayer, HashFunc, LayerFactory, LayerReadWriter, LayerReader, LayerWriter,
    Node, SliceLayer, NODE_SIZE, PADDING_VALUE,
};
