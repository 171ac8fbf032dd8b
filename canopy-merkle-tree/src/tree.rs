//! Streaming Merkle tree construction.
//!
//! Leaves are appended one at a time; each layer parks at most one left
//! sibling awaiting its right sibling, so construction needs O(log n) memory.
//! Layers admitted by the cache policy are teed into the cache as nodes are
//! produced, and proof nodes for the proven leaves fall out of the same pass.

use canopy_layer_cache::{
    root_height_from_width, CacheWriter, HashFunc, LayerReader, Node, PADDING_VALUE,
};

use crate::{builder::TreeBuilder, error::CacheError, Error, Result};

/// A node paired with its proven-path mark: whether it is an ancestor of a
/// leaf whose membership is being proven.
#[derive(Clone, Debug)]
pub(crate) struct TreeNode {
    pub(crate) value: Node,
    pub(crate) on_proven_path: bool,
}

pub(crate) fn padding_node() -> TreeNode {
    TreeNode {
        value: PADDING_VALUE.to_vec(),
        on_proven_path: false,
    }
}

pub(crate) fn calc_parent(hash: HashFunc, left: &TreeNode, right: &TreeNode) -> TreeNode {
    TreeNode {
        value: hash(&left.value, &right.value),
        on_proven_path: left.on_proven_path || right.on_proven_path,
    }
}

/// Per-layer construction state: the parked left sibling, if any. The slot is
/// occupied iff the number of nodes that reached the layer is odd.
#[derive(Default)]
struct LayerState {
    parking: Option<TreeNode>,
}

/// Streams over the sorted proven-leaf indices, answering "is the next-added
/// leaf proven?" one leaf at a time.
pub(crate) struct SparseBoolStack {
    sorted_true_indices: Vec<u64>,
    offset: usize,
    current_index: u64,
}

impl SparseBoolStack {
    pub(crate) fn new(sorted_true_indices: Vec<u64>) -> Self {
        SparseBoolStack {
            sorted_true_indices,
            offset: 0,
            current_index: 0,
        }
    }

    pub(crate) fn pop(&mut self) -> bool {
        let hit = self.sorted_true_indices.get(self.offset) == Some(&self.current_index);
        if hit {
            self.offset += 1;
        }
        self.current_index += 1;
        hit
    }
}

/// A streaming Merkle tree.
///
/// Calculates the root of the appended leaves and, optionally, a proof for
/// leaves designated in advance. Uses O(log n) memory for the root and
/// O(k·log n) for proofs of k leaves. Construct through [`TreeBuilder`] or
/// the [`Tree::new`] / [`Tree::proving`] / [`Tree::caching`] shortcuts.
///
/// Not safe for shared use; all methods take exclusive access.
pub struct Tree {
    layers: Vec<LayerState>,
    hash: HashFunc,
    proof: Vec<Node>,
    leaves_to_prove: SparseBoolStack,
    cache: CacheWriter,
    min_height: u32,
}

impl Tree {
    /// A plain tree with the default SHA-256 parent function.
    pub fn new() -> Tree {
        TreeBuilder::new().build()
    }

    /// A tree that collects a membership proof for the given leaf indices.
    pub fn proving(leaves_to_prove: &[u64]) -> Tree {
        TreeBuilder::new().with_leaves_to_prove(leaves_to_prove).build()
    }

    /// A tree that tees its layers into the given cache.
    pub fn caching(cache_writer: CacheWriter) -> Tree {
        TreeBuilder::new().with_cache_writer(cache_writer).build()
    }

    pub(crate) fn from_builder_parts(
        hash: HashFunc,
        leaves_to_prove: Vec<u64>,
        cache: CacheWriter,
        min_height: u32,
    ) -> Tree {
        Tree {
            layers: vec![LayerState::default()],
            hash,
            proof: Vec::new(),
            leaves_to_prove: SparseBoolStack::new(leaves_to_prove),
            cache,
            min_height,
        }
    }

    /// Incorporate the next leaf.
    ///
    /// Updates the state required to eventually determine the root and, if
    /// applicable, the proof. A failure to cache a node does not stop
    /// construction: the propagation completes, the tree stays usable, and
    /// the last caching error is returned. Callers that require a complete
    /// cache must treat any error as fatal.
    pub fn add_leaf(&mut self, value: &[u8]) -> Result<()> {
        let mut node = TreeNode {
            value: value.to_vec(),
            on_proven_path: self.leaves_to_prove.pop(),
        };
        let mut height = 0u32;
        let mut last_caching_error: Option<Error> = None;

        loop {
            if self.layers.len() <= height as usize {
                self.layers.push(LayerState::default());
            }

            // Tee the node into this layer's cache, if admitted.
            match self.cache.layer_writer(height) {
                Ok(Some(writer)) => {
                    if let Err(e) = writer.append(&node.value) {
                        last_caching_error = Some(Error::Caching(e));
                    }
                }
                Ok(None) => {}
                Err(e) => last_caching_error = Some(Error::Caching(e)),
            }

            let layer = &mut self.layers[height as usize];
            match layer.parking.take() {
                // This node is a left sibling; park it until its right
                // sibling arrives.
                None => {
                    layer.parking = Some(node);
                    break;
                }
                Some(left) => {
                    let right = node;
                    let parent = calc_parent(self.hash, &left, &right);

                    // A node belongs in the proof iff its parent is on the
                    // proven path but the node itself is not.
                    if parent.on_proven_path {
                        if !left.on_proven_path {
                            self.proof.push(left.value);
                        }
                        if !right.on_proven_path {
                            self.proof.push(right.value);
                        }
                    }

                    node = parent;
                    height += 1;
                }
            }
        }

        match last_caching_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// The root of the tree. For an unbalanced tree (leaf count not a power
    /// of two) padding is applied on the fly. Idempotent; does not mutate the
    /// tree. Returns an empty node for an empty tree.
    pub fn root(&self) -> Node {
        self.root_and_proof().0
    }

    /// The membership proof for the leaves designated at construction: for a
    /// single proven leaf, one sibling per layer from the leaves to the root,
    /// excluding the proven leaf and the root.
    pub fn proof(&self) -> Vec<Node> {
        self.root_and_proof().1
    }

    /// The root together with the proof, computed in one pad-aware walk over
    /// the parked columns.
    pub fn root_and_proof(&self) -> (Node, Vec<Node>) {
        let mut ephemeral_proof = self.proof.clone();
        let mut ephemeral_node: Option<TreeNode> = None;

        let mut height = 0u32;
        loop {
            let layer = self.layers.get(height as usize);
            if height >= self.min_height && layer.is_none() {
                break;
            }

            // On the last materialized layer with nothing carried, the parked
            // node is the root of an exactly balanced tree.
            let reached_min_height = height >= self.min_height;
            let on_last_layer = layer.is_some() && height as usize == self.layers.len() - 1;
            if reached_min_height && on_last_layer && ephemeral_node.is_none() {
                let root = layer
                    .and_then(|l| l.parking.as_ref())
                    .map(|parked| parked.value.clone())
                    .unwrap_or_default();
                return (root, ephemeral_proof);
            }

            let parking = layer.and_then(|l| l.parking.as_ref());
            if let Some((parent, left, right)) =
                calc_ephemeral_parent(self.hash, parking, ephemeral_node.as_ref())
            {
                if parent.on_proven_path {
                    if !left.on_proven_path {
                        ephemeral_proof.push(left.value);
                    }
                    if !right.on_proven_path {
                        ephemeral_proof.push(right.value);
                    }
                }
                ephemeral_node = Some(parent);
            } else {
                ephemeral_node = None;
            }
            height += 1;
        }

        let root = ephemeral_node.map(|n| n.value).unwrap_or_default();
        (root, ephemeral_proof)
    }

    /// The parked values per layer, bottom up; empty slots are `None`.
    /// Together with [`Tree::set_parked_nodes`] this allows snapshotting
    /// construction and resuming it in another process.
    pub fn get_parked_nodes(&self) -> Vec<Option<Node>> {
        self.layers
            .iter()
            .map(|layer| layer.parking.as_ref().map(|parked| parked.value.clone()))
            .collect()
    }

    /// Restore parked values captured by [`Tree::get_parked_nodes`], creating
    /// layer states as needed. Restored nodes carry no proven-path marks.
    pub fn set_parked_nodes(&mut self, nodes: Vec<Option<Node>>) {
        while self.layers.len() < nodes.len() {
            self.layers.push(LayerState::default());
        }
        for (height, value) in nodes.into_iter().enumerate() {
            if let Some(value) = value {
                self.layers[height].parking = Some(TreeNode {
                    value,
                    on_proven_path: false,
                });
            }
        }
    }

    /// Hand back the cache writer once construction is done, so its reader
    /// can be obtained.
    pub fn into_cache(self) -> CacheWriter {
        self.cache
    }
}

impl Default for Tree {
    fn default() -> Self {
        Tree::new()
    }
}

/// Parent of the layer parking and the carried ephemeral node, padding with
/// [`PADDING_VALUE`] when one side is missing. Returns the parent along with
/// the actual children used, or `None` when both sides are empty.
fn calc_ephemeral_parent(
    hash: HashFunc,
    parking: Option<&TreeNode>,
    ephemeral_node: Option<&TreeNode>,
) -> Option<(TreeNode, TreeNode, TreeNode)> {
    let (left, right) = match (parking, ephemeral_node) {
        (Some(parked), Some(ephemeral)) => (parked.clone(), ephemeral.clone()),
        (Some(parked), None) => (parked.clone(), padding_node()),
        (None, Some(ephemeral)) => (ephemeral.clone(), padding_node()),
        (None, None) => return None,
    };
    let parent = calc_parent(hash, &left, &right);
    Some((parent, left, right))
}

/// Feed `width` leaves from `reader` through a fresh tree, proving the given
/// subtree-relative indices. `external_padding` is consumed at most once when
/// the reader ends early; without it the traversal simply stops at the tape
/// edge and the tree's own padding takes over.
pub(crate) fn traverse_subtree(
    reader: &mut dyn LayerReader,
    width: u64,
    hash: HashFunc,
    leaves_to_prove: &[u64],
    mut external_padding: Option<Node>,
) -> Result<(Node, Vec<Node>, Vec<Node>)> {
    let mut tree = TreeBuilder::new()
        .with_hash_func(hash)
        .with_leaves_to_prove(leaves_to_prove)
        // ensures the correct size tree, even if padding is needed
        .with_min_height(root_height_from_width(width))
        .build();
    let mut proven_leaves = Vec::new();
    let mut to_prove = leaves_to_prove.iter().copied().peekable();

    for i in 0..width {
        let leaf = match reader.read_next() {
            Ok(value) => value,
            Err(CacheError::EndOfStream) => match external_padding.take() {
                Some(padding) => padding,
                None => break,
            },
            Err(e) => return Err(Error::ReadLeaf(e)),
        };
        tree.add_leaf(&leaf).map_err(|e| Error::AddLeaf(Box::new(e)))?;
        if to_prove.peek() == Some(&i) {
            to_prove.next();
            proven_leaves.push(leaf);
        }
    }

    let (root, proof) = tree.root_and_proof();
    Ok((root, proof, proven_leaves))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sparse_bool_stack() {
        let mut all_false = SparseBoolStack::new(vec![]);
        for _ in 0..1000 {
            assert!(!all_false.pop());
        }

        let mut all_true = SparseBoolStack::new((0..10).collect());
        for _ in 0..10 {
            assert!(all_true.pop());
        }

        let rounds: Vec<u64> = (0..1000).step_by(10).collect();
        let mut rounds_true = SparseBoolStack::new(rounds);
        for i in 0..1000 {
            assert_eq!(rounds_true.pop(), i % 10 == 0);
        }
    }

    #[test]
    fn test_padding_node_is_not_on_proven_path() {
        let node = padding_node();
        assert_eq!(node.value, PADDING_VALUE.to_vec());
        assert!(!node.on_proven_path);
    }
}
