use thiserror::Error;

use crate::Position;

pub use canopy_layer_cache::Error as CacheError;

/// Alias for `core::result::Result<T, Error>`.
pub type Result<T> = core::result::Result<T, Error>;

/// Errors from tree construction, proof generation and proof validation.
///
/// Context-wrapping variants add a one-line prefix each time an error
/// bubbles; the leaf message is never altered.
#[derive(Debug, Error)]
pub enum Error {
    /// A node below every cached layer was requested; doubles as the internal
    /// sentinel distinguishing "hit the tape edge" from real I/O failure.
    #[error("reader for base layer must be included")]
    MissingValueAtBaseLayer,

    /// Seeking a cached layer failed.
    #[error("while seeking to Position {0} in cache: {1}")]
    CacheSeek(Position, #[source] CacheError),

    /// Reading a cached layer failed.
    #[error("while reading from cache: {0}")]
    CacheRead(#[source] CacheError),

    /// Fetching a cached layer's width failed.
    #[error("while getting reader width: {0}")]
    CacheWidth(#[source] CacheError),

    /// Computing the padding node for a ragged subtree edge failed.
    #[error("while calculating ephemeral node at Position {0}: {1}")]
    EphemeralNode(Position, #[source] Box<Error>),

    /// Positioning the leaf reader at a subtree's first leaf failed.
    #[error("while preparing to traverse subtree: {0}")]
    PrepareTraversal(#[source] CacheError),

    /// Recomputing a proof subtree failed.
    #[error("while traversing subtree: {0}")]
    Traversal(#[source] Box<Error>),

    /// Recomputing a missing node's subtree failed.
    #[error("while traversing subtree for root: {0}")]
    TraversalForRoot(#[source] Box<Error>),

    /// Reading a leaf during subtree traversal failed.
    #[error("while reading a leaf: {0}")]
    ReadLeaf(#[source] CacheError),

    /// Feeding a leaf into a traversal tree failed.
    #[error("while adding a leaf: {0}")]
    AddLeaf(#[source] Box<Error>),

    /// A layer cache rejected an append during construction. Construction
    /// continues; the last such error is reported.
    #[error("error while caching: {0}")]
    Caching(#[source] CacheError),

    /// Validation input lengths disagree.
    #[error("number of leaves ({leaves}) must equal number of indices ({indices})")]
    MismatchedLeafCount {
        /// Number of leaf values supplied.
        leaves: usize,
        /// Number of leaf indices supplied.
        indices: usize,
    },

    /// Validation requires at least one proven leaf.
    #[error("at least one leaf is required for validation")]
    NoLeaves,

    /// Validation leaf indices must be sorted ascending.
    #[error("leafIndices are not sorted")]
    UnsortedLeafIndices,

    /// Validation leaf indices must be unique.
    #[error("leafIndices contain duplicates")]
    DuplicateLeafIndices,

    /// A cursor was exhausted.
    #[error("no more items")]
    NoMoreItems,

    /// A cache error outside any of the wrapping contexts above.
    #[error(transparent)]
    Cache(#[from] CacheError),
}
