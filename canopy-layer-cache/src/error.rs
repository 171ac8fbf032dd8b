use thiserror::Error;

/// Alias for `core::result::Result<T, Error>`.
pub type Result<T> = core::result::Result<T, Error>;

/// Errors from layer and cache operations.
#[derive(Debug, Error)]
pub enum Error {
    /// A seek or read moved past the last stored node. This is a control-flow
    /// sentinel, not a failure: callers fall back to computing the node or
    /// substituting padding.
    #[error("end of stream")]
    EndOfStream,

    /// The cache has no layer at height 0.
    #[error("reader for base layer must be included")]
    MissingBaseLayer,

    /// The cache's base layer holds no nodes.
    #[error("base layer cannot be empty")]
    EmptyBaseLayer,

    /// A cached layer's width disagrees with the base layer geometry.
    #[error("reader at layer {layer} has width {actual} instead of {expected}")]
    WidthMismatch {
        /// Height of the offending layer.
        layer: u32,
        /// Width reported by the layer.
        actual: u64,
        /// Width implied by the base layer.
        expected: u64,
    },

    /// Grouping requires at least two layers.
    #[error("number of layers must be at least 2")]
    NotEnoughLayers,

    /// Grouped layers must hold at least one node each.
    #[error("0 width layers are not allowed")]
    ZeroWidthLayer,

    /// All grouped layers except the last must share one width.
    #[error("layers width mismatch")]
    LayersWidthMismatch,

    /// Merging requires at least two caches.
    #[error("number of caches must be at least 2")]
    NotEnoughCaches,

    /// Merged caches must all hold layers at the same heights.
    #[error("number of layers per height mismatch")]
    LayerCountMismatch,

    /// Write access to a grouped layer.
    #[error("group layer is read-only")]
    GroupLayerReadOnly,

    /// A failure reported by an externally supplied layer implementation.
    #[error("{0}")]
    Layer(String),

    /// An I/O failure from a file-backed layer.
    #[error("{0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// `true` for the [`Error::EndOfStream`] sentinel.
    pub fn is_end_of_stream(&self) -> bool {
        matches!(self, Error::EndOfStream)
    }
}
