use std::collections::BTreeMap;

use crate::{
    root_height_from_width, CachingPolicy, Error, HashFunc, LayerFactory, LayerReadWriter,
    LayerReader, Result,
};

/// The read side of a cache: a validated, read-only view over the layers a
/// [`CacheWriter`](crate::CacheWriter) accumulated.
///
/// Reads go through each layer's own cursor, so a reader requires exclusive
/// access; clone the backing layers or serialize use for concurrency.
pub struct CacheReader {
    layers: BTreeMap<u32, Box<dyn LayerReadWriter>>,
    hash: HashFunc,
    policy: CachingPolicy,
    factory: LayerFactory,
}

impl std::fmt::Debug for CacheReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheReader")
            .field("layers", &self.layers.keys().collect::<Vec<_>>())
            .field("hash", &self.hash)
            .field("policy", &self.policy)
            .field("factory", &self.factory)
            .finish()
    }
}

impl CacheReader {
    /// Build a reader over `layers`, validating the cache geometry: the base
    /// layer must be present and non-empty, and every cached height below the
    /// tree height must hold exactly the base width shifted down that many
    /// times.
    pub fn from_layers(
        layers: BTreeMap<u32, Box<dyn LayerReadWriter>>,
        hash: HashFunc,
        policy: CachingPolicy,
        factory: LayerFactory,
    ) -> Result<Self> {
        validate_structure(&layers)?;
        Ok(CacheReader {
            layers,
            hash,
            policy,
            factory,
        })
    }

    pub(crate) fn from_parts_unchecked(
        layers: BTreeMap<u32, Box<dyn LayerReadWriter>>,
        hash: HashFunc,
        policy: CachingPolicy,
        factory: LayerFactory,
    ) -> Self {
        CacheReader {
            layers,
            hash,
            policy,
            factory,
        }
    }

    /// The reader for the layer at `height`, if cached.
    pub fn layer_reader(&mut self, height: u32) -> Option<&mut dyn LayerReader> {
        self.layers
            .get_mut(&height)
            .map(|layer| layer.as_mut() as &mut dyn LayerReader)
    }

    /// Whether a layer is cached at `height`.
    pub fn has_layer(&self, height: u32) -> bool {
        self.layers.contains_key(&height)
    }

    /// The hash function the cached tree was built with.
    pub fn hash_func(&self) -> HashFunc {
        self.hash
    }

    /// Dismantle the reader into its layers, hash, policy and factory.
    #[allow(clippy::type_complexity)]
    pub fn into_parts(
        self,
    ) -> (
        BTreeMap<u32, Box<dyn LayerReadWriter>>,
        HashFunc,
        CachingPolicy,
        LayerFactory,
    ) {
        (self.layers, self.hash, self.policy, self.factory)
    }
}

fn validate_structure(layers: &BTreeMap<u32, Box<dyn LayerReadWriter>>) -> Result<()> {
    let base = layers.get(&0).ok_or(Error::MissingBaseLayer)?;
    let mut width = base.width()?;
    if width == 0 {
        return Err(Error::EmptyBaseLayer);
    }
    let height = root_height_from_width(width);
    for layer in 0..height {
        if let Some(rw) = layers.get(&layer) {
            let actual = rw.width()?;
            if actual != width {
                return Err(Error::WidthMismatch {
                    layer,
                    actual,
                    expected: width,
                });
            }
        }
        width >>= 1;
    }
    Ok(())
}
