//! Proof generation against a partially cached tree.
//!
//! The generator walks the sorted proven leaves in groups, one group per
//! minimal cached subtree: it recomputes each subtree's relative proof by
//! streaming its base-layer slice through a local tree, then ascends through
//! the cached layers emitting siblings, skipping any sibling it will instead
//! descend into for a later group. Nodes missing from the cache are
//! recomputed on the fly, with padding for ragged right edges.

use std::collections::BTreeSet;

use canopy_layer_cache::{root_height_from_width, CacheReader, Node, PADDING_VALUE};

use crate::{
    error::CacheError,
    iterators::PositionsIterator,
    position::PositionsStack,
    tree::traverse_subtree,
    Error, Position, Result,
};

/// Generate a membership proof for `proven_leaf_indices` from a cache.
///
/// Returns the indices sorted ascending, the proven leaf values in that
/// order, and the proof nodes. The output is deterministic and matches what a
/// proving tree built with the same leaves would emit, as long as the cache
/// covers the base layer.
pub fn generate_proof(
    proven_leaf_indices: &[u64],
    cache: &mut CacheReader,
) -> Result<(Vec<u64>, Vec<Node>, Vec<Node>)> {
    let sorted_indices: Vec<u64> = proven_leaf_indices
        .iter()
        .copied()
        .collect::<BTreeSet<u64>>()
        .into_iter()
        .collect();
    let mut proven_leaf_it = PositionsIterator::new(&sorted_indices);
    let mut skip_positions = PositionsStack::default();
    let mut proven_leaves = Vec::new();
    let mut proof_nodes = Vec::new();

    let width = base_layer_width(cache)?;
    let root_height = root_height_from_width(width);

    // Process one proven-leaf group per subtree.
    while let Some(next_proven_leaf) = proven_leaf_it.peek() {
        let (root, first_leaf, width) = subtree_definition(cache, next_proven_leaf)?;

        let leaves_to_prove = proven_leaf_it.batch_pop(first_leaf.index + width);
        let (mut additional_proof, mut additional_leaves) =
            calc_subtree_proof(cache, &leaves_to_prove, first_leaf, width)?;
        proof_nodes.append(&mut additional_proof);
        proven_leaves.append(&mut additional_leaves);

        // Ascend from the subtree root towards the tree root.
        let mut current_pos = root;
        while current_pos.height < root_height {
            // Revisiting a node we descended into: move on to the parent
            // without emitting its sibling.
            if skip_positions.pop_if_equal(current_pos) {
                current_pos = current_pos.parent();
                continue;
            }

            // If the sibling is an ancestor of the next proven leaf, its
            // subtree is processed by a later group; skip it when we return.
            if let Some(next) = proven_leaf_it.peek() {
                if current_pos.sibling().is_ancestor_of(next) {
                    skip_positions.push(current_pos.sibling());
                    break;
                }
            }

            proof_nodes.push(get_node(cache, current_pos.sibling())?);
            current_pos = current_pos.parent();
        }
    }

    Ok((sorted_indices, proven_leaves, proof_nodes))
}

fn base_layer_width(cache: &mut CacheReader) -> Result<u64> {
    let reader = cache
        .layer_reader(0)
        .ok_or(Error::MissingValueAtBaseLayer)?;
    Ok(reader.width()?)
}

/// The minimal subtree whose base layer includes `p` and whose root is on a
/// cached layer: its root and first-leaf positions and its base width. If no
/// cached layer exists above the base, the subtree reaches the tree root.
fn subtree_definition(
    cache: &mut CacheReader,
    p: Position,
) -> Result<(Position, Position, u64)> {
    // The tree height bounds the ascent.
    let width = cache
        .layer_reader(p.height)
        .ok_or(Error::MissingValueAtBaseLayer)?
        .width()?;
    let max_root_height = root_height_from_width(width);

    let mut root = p;
    // A single-leaf base layer is its own (degenerate) subtree.
    if !(p.height == 0 && width == 1) {
        root = p.parent();
        while root.height < max_root_height && !cache.has_layer(root.height) {
            root = root.parent();
        }
    }

    let subtree_height = root.height - p.height;
    let first_leaf = Position {
        index: root.index << subtree_height,
        height: p.height,
    };
    Ok((root, first_leaf, 1u64 << subtree_height))
}

/// Recompute the relative proof for one subtree by streaming its base-layer
/// slice through a local proving tree.
fn calc_subtree_proof(
    cache: &mut CacheReader,
    leaves_to_prove: &[u64],
    subtree_start: Position,
    width: u64,
) -> Result<(Vec<Node>, Vec<Node>)> {
    // Reindex the group relative to the subtree.
    let relative_leaves_to_prove: Vec<u64> = leaves_to_prove
        .iter()
        .map(|index| index - subtree_start.index)
        .collect();

    let hash = cache.hash_func();
    let reader = cache
        .layer_reader(0)
        .ok_or(Error::MissingValueAtBaseLayer)?;
    reader
        .seek(subtree_start.index)
        .map_err(Error::PrepareTraversal)?;

    let (_, additional_proof, additional_leaves) =
        traverse_subtree(reader, width, hash, &relative_leaves_to_prove, None)
            .map_err(|e| Error::Traversal(Box::new(e)))?;

    Ok((additional_proof, additional_leaves))
}

/// Read the node at `node_pos` from the cache, or recompute it when the
/// position's layer is missing or ends before it.
pub fn get_node(cache: &mut CacheReader, node_pos: Position) -> Result<Node> {
    let seek_result = match cache.layer_reader(node_pos.height) {
        Some(reader) => reader.seek(node_pos.index),
        None => return calc_node(cache, node_pos),
    };
    match seek_result {
        Ok(()) => {
            let reader = cache
                .layer_reader(node_pos.height)
                .expect("layer present");
            reader.read_next().map_err(Error::CacheRead)
        }
        Err(CacheError::EndOfStream) => calc_node(cache, node_pos),
        Err(e) => Err(Error::CacheSeek(node_pos, e)),
    }
}

/// Recompute a node by traversing the minimal cached subtree below it.
///
/// Descends left children until a cached layer can serve the subtree's first
/// node. A subtree lying entirely past the materialized width is padding by
/// definition. One that extends partly past it needs an ephemeral padding
/// node, recomputed recursively from the layer's ragged edge.
fn calc_node(cache: &mut CacheReader, node_pos: Position) -> Result<Node> {
    if node_pos.height == 0 {
        return Err(Error::MissingValueAtBaseLayer);
    }

    // Find the closest cached layer below that reaches the subtree start.
    let mut subtree_start = node_pos;
    loop {
        subtree_start = subtree_start.left_child();
        let seek_result = match cache.layer_reader(subtree_start.height) {
            Some(reader) => reader.seek(subtree_start.index),
            None => Err(CacheError::EndOfStream),
        };
        match seek_result {
            Ok(()) => break,
            Err(CacheError::EndOfStream) => {
                if subtree_start.height == 0 {
                    return Ok(PADDING_VALUE.to_vec());
                }
            }
            Err(e) => return Err(Error::CacheSeek(subtree_start, e)),
        }
    }

    let width = 1u64 << (node_pos.height - subtree_start.height);
    let reader_width = cache
        .layer_reader(subtree_start.height)
        .expect("cached layer present")
        .width()
        .map_err(Error::CacheWidth)?;

    // The subtree extends past the layer's edge: derive the padding value the
    // construction would have used there.
    let mut external_padding = None;
    if reader_width < subtree_start.index + width {
        let padding_pos = Position {
            index: reader_width,
            height: subtree_start.height,
        };
        external_padding = Some(match calc_node(cache, padding_pos) {
            Ok(value) => value,
            Err(Error::MissingValueAtBaseLayer) => PADDING_VALUE.to_vec(),
            Err(e) => return Err(Error::EphemeralNode(padding_pos, Box::new(e))),
        });
    }

    let hash = cache.hash_func();
    let reader = cache
        .layer_reader(subtree_start.height)
        .expect("cached layer present");
    reader
        .seek(subtree_start.index)
        .map_err(|e| Error::CacheSeek(subtree_start, e))?;
    let (root, _, _) = traverse_subtree(reader, width, hash, &[], external_padding)
        .map_err(|e| Error::TraversalForRoot(Box::new(e)))?;
    Ok(root)
}
