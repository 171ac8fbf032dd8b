use crate::{Error, LayerReader, LayerWriter, Node, Result, NODE_SIZE};

/// In-memory layer backed by a vector of nodes.
///
/// Useful for tests and ephemeral caches. Reads always return
/// [`NODE_SIZE`]-byte copies: shorter stored values are zero-padded, longer
/// ones truncated.
#[derive(Debug, Default)]
pub struct SliceLayer {
    nodes: Vec<Node>,
    position: u64,
}

impl SliceLayer {
    /// Create an empty layer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a layer holding `nodes`.
    pub fn from_nodes(nodes: Vec<Node>) -> Self {
        SliceLayer { nodes, position: 0 }
    }

    /// The stored nodes, as appended.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }
}

impl LayerReader for SliceLayer {
    fn seek(&mut self, index: u64) -> Result<()> {
        if index >= self.nodes.len() as u64 {
            return Err(Error::EndOfStream);
        }
        self.position = index;
        Ok(())
    }

    fn read_next(&mut self) -> Result<Node> {
        let Some(stored) = self.nodes.get(self.position as usize) else {
            return Err(Error::EndOfStream);
        };
        let mut value = vec![0u8; NODE_SIZE];
        let n = stored.len().min(NODE_SIZE);
        value[..n].copy_from_slice(&stored[..n]);
        self.position += 1;
        Ok(value)
    }

    fn width(&self) -> Result<u64> {
        Ok(self.nodes.len() as u64)
    }
}

impl LayerWriter for SliceLayer {
    fn append(&mut self, node: &[u8]) -> Result<()> {
        self.nodes.push(node.to_vec());
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}
