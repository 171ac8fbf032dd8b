use canopy_layer_cache::{sha256_parent, CacheWriter, HashFunc};

use crate::Tree;

/// Builder for [`Tree`]. The knobs are independent and default sensibly:
/// SHA-256 parent hashing, no proven leaves, no caching, no minimum height.
pub struct TreeBuilder {
    hash: HashFunc,
    leaves_to_prove: Vec<u64>,
    cache: Option<CacheWriter>,
    min_height: u32,
}

impl TreeBuilder {
    pub fn new() -> TreeBuilder {
        TreeBuilder {
            hash: sha256_parent,
            leaves_to_prove: Vec::new(),
            cache: None,
            min_height: 0,
        }
    }

    /// Use `hash` to derive parents. The cache writer, if any, records the
    /// same function for later proof generation.
    pub fn with_hash_func(mut self, hash: HashFunc) -> TreeBuilder {
        self.hash = hash;
        self
    }

    /// Collect a membership proof for these leaf indices while building.
    pub fn with_leaves_to_prove(mut self, leaves_to_prove: &[u64]) -> TreeBuilder {
        self.leaves_to_prove = leaves_to_prove.to_vec();
        self
    }

    /// Tee layers into `cache_writer` during construction.
    pub fn with_cache_writer(mut self, cache_writer: CacheWriter) -> TreeBuilder {
        self.cache = Some(cache_writer);
        self
    }

    /// Enforce a minimum tree height at finalization; padding is added above
    /// the materialized layers until this height is reached.
    pub fn with_min_height(mut self, min_height: u32) -> TreeBuilder {
        self.min_height = min_height;
        self
    }

    pub fn build(self) -> Tree {
        let mut leaves_to_prove = self.leaves_to_prove;
        leaves_to_prove.sort_unstable();
        leaves_to_prove.dedup();

        let mut cache = self.cache.unwrap_or_default();
        cache.set_hash(self.hash);

        Tree::from_builder_parts(self.hash, leaves_to_prove, cache, self.min_height)
    }
}

impl Default for TreeBuilder {
    fn default() -> Self {
        TreeBuilder::new()
    }
}
