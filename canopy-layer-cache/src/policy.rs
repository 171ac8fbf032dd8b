use std::collections::BTreeSet;

/// Decides which tree heights a cache materializes.
///
/// A small fixed set of policies covers practical caching schemes; `Combine`
/// composes them by disjunction.
#[derive(Clone, Debug)]
pub enum CachingPolicy {
    /// Cache every layer at height ≥ the given minimum.
    MinHeight(u32),
    /// Cache exactly the given heights.
    SpecificLayers(BTreeSet<u32>),
    /// Cache a height admitted by either policy.
    Combine(Box<CachingPolicy>, Box<CachingPolicy>),
    /// Evaluate the inner policy at `height + offset`. Used when building the
    /// top of a cache whose leaves sit at a non-zero height of the full tree.
    Shifted(Box<CachingPolicy>, u32),
}

impl CachingPolicy {
    /// Cache exactly the given heights.
    pub fn specific_layers(heights: impl IntoIterator<Item = u32>) -> Self {
        CachingPolicy::SpecificLayers(heights.into_iter().collect())
    }

    /// Combine two policies by disjunction.
    pub fn combine(first: CachingPolicy, second: CachingPolicy) -> Self {
        CachingPolicy::Combine(Box::new(first), Box::new(second))
    }

    /// Whether a layer at `height` should be cached.
    pub fn admits(&self, height: u32) -> bool {
        match self {
            CachingPolicy::MinHeight(min) => height >= *min,
            CachingPolicy::SpecificLayers(layers) => layers.contains(&height),
            CachingPolicy::Combine(first, second) => {
                first.admits(height) || second.admits(height)
            }
            CachingPolicy::Shifted(inner, offset) => inner.admits(height + offset),
        }
    }
}

impl Default for CachingPolicy {
    /// The default policy caches nothing.
    fn default() -> Self {
        CachingPolicy::SpecificLayers(BTreeSet::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_min_height() {
        let policy = CachingPolicy::MinHeight(7);
        assert!(!policy.admits(0));
        assert!(!policy.admits(6));
        assert!(policy.admits(7));
        assert!(policy.admits(23));
    }

    #[test]
    fn test_specific_layers() {
        let policy = CachingPolicy::specific_layers([0, 2]);
        assert!(policy.admits(0));
        assert!(!policy.admits(1));
        assert!(policy.admits(2));
        assert!(!policy.admits(3));
    }

    #[test]
    fn test_combine() {
        let policy = CachingPolicy::combine(
            CachingPolicy::specific_layers([0]),
            CachingPolicy::MinHeight(7),
        );
        assert!(policy.admits(0));
        assert!(!policy.admits(1));
        assert!(policy.admits(8));
    }

    #[test]
    fn test_shifted() {
        let policy = CachingPolicy::Shifted(Box::new(CachingPolicy::MinHeight(10)), 8);
        assert!(!policy.admits(1));
        assert!(policy.admits(2));
    }

    #[test]
    fn test_default_caches_nothing() {
        let policy = CachingPolicy::default();
        assert!(!policy.admits(0));
        assert!(!policy.admits(5));
    }
}
