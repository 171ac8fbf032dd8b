//! Rebuilding the top of a cache.
//!
//! A cache produced by [`merge`](canopy_layer_cache::merge) covers every
//! subtree's layers but stops at the merged caches' highest height. The top
//! of the full tree is recovered by streaming that highest layer through a
//! fresh caching tree and grafting the resulting layers above the existing
//! ones.

use canopy_layer_cache::{CacheReader, CacheWriter, CachingPolicy, Node};

use crate::{error::CacheError, Result, TreeBuilder};

/// Build the layers above `reader`'s highest cached layer and return the
/// completed cache along with the tree root.
///
/// The original caching policy decides which of the new layers to keep,
/// evaluated at their height in the full tree.
pub fn build_top(reader: CacheReader) -> Result<(CacheReader, Node)> {
    let (mut layers, hash, policy, factory) = reader.into_parts();
    let max_height = *layers.keys().next_back().ok_or(CacheError::MissingBaseLayer)?;

    let subtree_writer = CacheWriter::new(
        CachingPolicy::Shifted(Box::new(policy.clone()), max_height),
        factory,
    );
    let mut subtree = TreeBuilder::new()
        .with_hash_func(hash)
        .with_cache_writer(subtree_writer)
        .build();

    // The highest cached layer becomes the subtree's leaves.
    let top_layer = layers.get_mut(&max_height).expect("checked");
    match top_layer.seek(0) {
        Ok(()) => loop {
            match top_layer.read_next() {
                Ok(value) => subtree.add_leaf(&value)?,
                Err(CacheError::EndOfStream) => break,
                Err(e) => return Err(e.into()),
            }
        },
        Err(CacheError::EndOfStream) => {}
        Err(e) => return Err(e.into()),
    }

    let root = subtree.root();

    // Graft the new layers above the existing ones. The subtree's base layer
    // duplicates the existing top layer and is dropped.
    let (subtree_layers, _, _, factory) = subtree.into_cache().into_parts()?;
    for (height, layer) in subtree_layers {
        if height == 0 {
            continue;
        }
        layers.insert(height + max_height, layer);
    }

    let reader = CacheReader::from_layers(layers, hash, policy, factory)?;
    Ok((reader, root))
}
