use std::collections::BTreeMap;

use crate::{
    sha256_parent, CacheReader, CachingPolicy, HashFunc, LayerFactory, LayerReadWriter,
    LayerWriter, Result,
};

/// The write side of a cache: maps heights to layers while a tree streams
/// through it.
///
/// Layers are created lazily, on the first append to a height the policy
/// admits. Once construction is done, [`CacheWriter::into_reader`] flushes
/// every layer, validates the cache geometry and produces the read-only view.
pub struct CacheWriter {
    layers: BTreeMap<u32, Box<dyn LayerReadWriter>>,
    policy: CachingPolicy,
    factory: LayerFactory,
    hash: HashFunc,
}

impl CacheWriter {
    /// A writer that caches the heights admitted by `policy`, creating layers
    /// through `factory`. The hash function defaults to
    /// [`sha256_parent`](crate::sha256_parent) until
    /// [`CacheWriter::set_hash`] is called.
    pub fn new(policy: CachingPolicy, factory: LayerFactory) -> Self {
        CacheWriter {
            layers: BTreeMap::new(),
            policy,
            factory,
            hash: sha256_parent,
        }
    }

    /// Install a layer at `height` unconditionally, replacing any existing
    /// one.
    pub fn set_layer(&mut self, height: u32, layer: Box<dyn LayerReadWriter>) {
        self.layers.insert(height, layer);
    }

    /// Record the hash function the cached tree is built with.
    pub fn set_hash(&mut self, hash: HashFunc) {
        self.hash = hash;
    }

    /// The writer for `height`: the existing layer if present, a
    /// freshly-created one if the policy admits the height and the factory
    /// supplies a layer, `None` otherwise.
    pub fn layer_writer(&mut self, height: u32) -> Result<Option<&mut dyn LayerWriter>> {
        if !self.layers.contains_key(&height) {
            if !self.policy.admits(height) {
                return Ok(None);
            }
            match self.factory.create(height)? {
                Some(layer) => {
                    self.layers.insert(height, layer);
                }
                None => return Ok(None),
            }
        }
        Ok(self
            .layers
            .get_mut(&height)
            .map(|layer| layer.as_mut() as &mut dyn LayerWriter))
    }

    /// Flush every layer, validate the cache structure and convert into a
    /// read-only view.
    pub fn into_reader(self) -> Result<CacheReader> {
        let (layers, hash, policy, factory) = self.into_parts()?;
        CacheReader::from_layers(layers, hash, policy, factory)
    }

    /// Flush every layer and dismantle the writer without structural
    /// validation. Used by merging flows that assemble readers from several
    /// caches.
    #[allow(clippy::type_complexity)]
    pub fn into_parts(
        mut self,
    ) -> Result<(
        BTreeMap<u32, Box<dyn LayerReadWriter>>,
        HashFunc,
        CachingPolicy,
        LayerFactory,
    )> {
        for layer in self.layers.values_mut() {
            layer.flush()?;
        }
        Ok((self.layers, self.hash, self.policy, self.factory))
    }
}

impl Default for CacheWriter {
    /// A writer that caches nothing.
    fn default() -> Self {
        CacheWriter::new(CachingPolicy::default(), LayerFactory::default())
    }
}
