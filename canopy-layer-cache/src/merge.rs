use std::collections::BTreeMap;

use crate::{
    CacheReader, CachingPolicy, Error, GroupLayer, HashFunc, LayerFactory, LayerReadWriter,
    Result,
};

/// Merge several caches into one unified reader.
///
/// The layers of all caches at each height are concatenated in argument order
/// through [`GroupLayer`]s; every height must appear in every cache. The hash
/// function, caching policy and layer factory are taken from the first cache.
pub fn merge(readers: Vec<CacheReader>) -> Result<CacheReader> {
    if readers.len() < 2 {
        return Err(Error::NotEnoughCaches);
    }
    let count = readers.len();

    let mut first: Option<(HashFunc, CachingPolicy, LayerFactory)> = None;
    let mut groups: BTreeMap<u32, Vec<Box<dyn LayerReadWriter>>> = BTreeMap::new();
    for reader in readers {
        let (layers, hash, policy, factory) = reader.into_parts();
        if first.is_none() {
            first = Some((hash, policy, factory));
        }
        for (height, layer) in layers {
            groups.entry(height).or_default().push(layer);
        }
    }
    let (hash, policy, factory) = first.expect("checked");

    let mut layers: BTreeMap<u32, Box<dyn LayerReadWriter>> = BTreeMap::new();
    for (height, group) in groups {
        if group.len() != count {
            return Err(Error::LayerCountMismatch);
        }
        layers.insert(height, Box::new(GroupLayer::new(group)?));
    }

    Ok(CacheReader::from_parts_unchecked(
        layers, hash, policy, factory,
    ))
}
