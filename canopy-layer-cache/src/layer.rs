//! The layer contract: an append-only tape of fixed-size nodes with
//! seek-and-read access.

use crate::{Node, Result};

/// Read access to a layer.
///
/// A reader holds a single position cursor, so it is not safe for concurrent
/// reads at different positions; clone the backing data or serialize access.
pub trait LayerReader {
    /// Position the cursor so the next [`LayerReader::read_next`] returns the
    /// node at `index`. Returns [`Error::EndOfStream`](crate::Error::EndOfStream)
    /// when `index` is at or past the layer width.
    fn seek(&mut self, index: u64) -> Result<()>;

    /// Return the node at the cursor and advance. Returns
    /// [`Error::EndOfStream`](crate::Error::EndOfStream) past the last node.
    fn read_next(&mut self) -> Result<Node>;

    /// Number of stored nodes.
    fn width(&self) -> Result<u64>;
}

/// Write access to a layer.
pub trait LayerWriter {
    /// Append one node. Fails only on an underlying I/O error.
    fn append(&mut self, node: &[u8]) -> Result<()>;

    /// Commit buffered writes. Idempotent.
    fn flush(&mut self) -> Result<()>;
}

/// A combined reader-writer. [`LayerReader::seek`] affects only the read
/// cursor, never the append position.
///
/// Resource release happens on drop; the file-backed layer flushes any
/// buffered writes then.
pub trait LayerReadWriter: LayerReader + LayerWriter {}

impl<T: LayerReader + LayerWriter> LayerReadWriter for T {}
