use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use crate::{FileLayer, LayerReadWriter, Result, SliceLayer};

/// Creates the backing layer for a height the caching policy admitted.
pub enum LayerFactory {
    /// A fresh in-memory [`SliceLayer`] per height.
    Slice,
    /// A [`FileLayer`] per height, stored as `layer-<height>.bin` under the
    /// root directory.
    File {
        /// Directory holding the layer files.
        root: PathBuf,
    },
    /// Pre-supplied layers, yielded at most once per height. Heights without
    /// an entry produce no layer.
    Fixed(BTreeMap<u32, Box<dyn LayerReadWriter>>),
}

impl std::fmt::Debug for LayerFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LayerFactory::Slice => write!(f, "LayerFactory::Slice"),
            LayerFactory::File { root } => {
                f.debug_struct("LayerFactory::File").field("root", root).finish()
            }
            LayerFactory::Fixed(layers) => f
                .debug_tuple("LayerFactory::Fixed")
                .field(&layers.keys().collect::<Vec<_>>())
                .finish(),
        }
    }
}

impl LayerFactory {
    /// Factory of file-backed layers rooted at `root`.
    pub fn file(root: impl AsRef<Path>) -> Self {
        LayerFactory::File {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Factory serving the given layer for one specific height.
    pub fn fixed(height: u32, layer: Box<dyn LayerReadWriter>) -> Self {
        LayerFactory::Fixed(BTreeMap::from([(height, layer)]))
    }

    /// Factory serving pre-supplied layers per height.
    pub fn fixed_layers(layers: BTreeMap<u32, Box<dyn LayerReadWriter>>) -> Self {
        LayerFactory::Fixed(layers)
    }

    pub(crate) fn create(&mut self, height: u32) -> Result<Option<Box<dyn LayerReadWriter>>> {
        match self {
            LayerFactory::Slice => Ok(Some(Box::new(SliceLayer::new()))),
            LayerFactory::File { root } => {
                let layer = FileLayer::open(root.join(format!("layer-{height}.bin")))?;
                Ok(Some(Box::new(layer)))
            }
            LayerFactory::Fixed(layers) => Ok(layers.remove(&height)),
        }
    }
}

impl Default for LayerFactory {
    /// The default factory supplies no layers.
    fn default() -> Self {
        LayerFactory::Fixed(BTreeMap::new())
    }
}
