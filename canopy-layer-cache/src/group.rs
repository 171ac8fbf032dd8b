use crate::{Error, LayerReadWriter, LayerReader, LayerWriter, Node, Result};

/// Read-only virtual concatenation of several layers.
///
/// All chunks except the last must share one width; the last may be shorter.
/// `seek` redirects by integer division and remainder, `read_next` rolls over
/// chunk boundaries. Exists to support merging independently constructed
/// subtree caches, so appending is not supported.
pub struct GroupLayer {
    chunks: Vec<Box<dyn LayerReadWriter>>,
    active_chunk: usize,
    width_per_chunk: u64,
    last_chunk_width: u64,
}

impl std::fmt::Debug for GroupLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GroupLayer")
            .field("chunks", &self.chunks.len())
            .field("active_chunk", &self.active_chunk)
            .field("width_per_chunk", &self.width_per_chunk)
            .field("last_chunk_width", &self.last_chunk_width)
            .finish()
    }
}

impl GroupLayer {
    /// Group `layers` into one unified layer.
    pub fn new(layers: Vec<Box<dyn LayerReadWriter>>) -> Result<Self> {
        if layers.len() < 2 {
            return Err(Error::NotEnoughLayers);
        }
        let width_per_chunk = layers[0].width()?;
        if width_per_chunk == 0 {
            return Err(Error::ZeroWidthLayer);
        }
        let mut last_chunk_width = 0;
        for (i, layer) in layers.iter().enumerate().skip(1) {
            let width = layer.width()?;
            if i == layers.len() - 1 {
                last_chunk_width = width;
            } else if width != width_per_chunk {
                return Err(Error::LayersWidthMismatch);
            }
        }
        Ok(GroupLayer {
            chunks: layers,
            active_chunk: 0,
            width_per_chunk,
            last_chunk_width,
        })
    }
}

impl LayerReader for GroupLayer {
    fn seek(&mut self, index: u64) -> Result<()> {
        let chunk = (index / self.width_per_chunk) as usize;
        if chunk >= self.chunks.len() {
            return Err(Error::EndOfStream);
        }
        // Rewind the other chunks so read_next rollover starts them from zero.
        if chunk != self.active_chunk {
            for (i, other) in self.chunks.iter_mut().enumerate() {
                if i != chunk {
                    other.seek(0)?;
                }
            }
            self.active_chunk = chunk;
        }
        self.chunks[self.active_chunk].seek(index % self.width_per_chunk)
    }

    fn read_next(&mut self) -> Result<Node> {
        loop {
            match self.chunks[self.active_chunk].read_next() {
                Ok(value) => return Ok(value),
                Err(Error::EndOfStream) if self.active_chunk < self.chunks.len() - 1 => {
                    self.active_chunk += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn width(&self) -> Result<u64> {
        Ok((self.chunks.len() as u64 - 1) * self.width_per_chunk + self.last_chunk_width)
    }
}

impl LayerWriter for GroupLayer {
    fn append(&mut self, _node: &[u8]) -> Result<()> {
        Err(Error::GroupLayerReadOnly)
    }

    fn flush(&mut self) -> Result<()> {
        Err(Error::GroupLayerReadOnly)
    }
}
