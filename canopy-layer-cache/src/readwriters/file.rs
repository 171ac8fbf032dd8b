use std::{
    fs::{File, OpenOptions},
    os::unix::fs::{FileExt, OpenOptionsExt},
    path::Path,
};

use crate::{Error, LayerReader, LayerWriter, Node, Result, NODE_SIZE};

const OWNER_READ_WRITE: u32 = 0o600;

/// Appends are buffered until this many nodes accumulate.
const WRITE_BUF_NODES: usize = 1024;

/// Reads fetch blocks of this many nodes.
const READ_BUF_NODES: usize = 1024;

/// Layer backed by a flat file of back-to-back [`NODE_SIZE`]-byte records.
///
/// Uses positioned I/O, so the read cursor and the append position never
/// interfere. The file is opened (or created) with mode `0600`. Appends are
/// buffered; [`LayerWriter::flush`] commits them and rewinds the read cursor
/// to the start, mirroring the cache lifecycle of write-everything then
/// read. [`LayerReader::width`] counts committed nodes only.
///
/// Buffered writes are also committed on drop, best-effort.
#[derive(Debug)]
pub struct FileLayer {
    file: File,
    // next node index returned by read_next
    read_cursor: u64,
    // committed file length in bytes
    flushed_len: u64,
    write_buf: Vec<u8>,
    read_buf: Vec<u8>,
    // byte offset of read_buf[0] in the file
    read_buf_start: u64,
}

impl FileLayer {
    /// Open (creating if needed) the layer file at `path`. An existing file's
    /// contents become the layer's committed nodes.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .mode(OWNER_READ_WRITE)
            .open(path)?;
        let flushed_len = file.metadata()?.len();
        Ok(FileLayer {
            file,
            read_cursor: 0,
            flushed_len,
            write_buf: Vec::new(),
            read_buf: Vec::new(),
            read_buf_start: 0,
        })
    }

    fn flush_writes(&mut self) -> Result<()> {
        if self.write_buf.is_empty() {
            return Ok(());
        }
        self.file.write_all_at(&self.write_buf, self.flushed_len)?;
        self.flushed_len += self.write_buf.len() as u64;
        self.write_buf.clear();
        Ok(())
    }

    // Load the block containing the record at byte `offset` into read_buf.
    fn fill_read_buf(&mut self, offset: u64) -> Result<()> {
        let end = self.flushed_len.min(offset + (READ_BUF_NODES * NODE_SIZE) as u64);
        self.read_buf.resize((end - offset) as usize, 0);
        self.file.read_exact_at(&mut self.read_buf, offset)?;
        self.read_buf_start = offset;
        Ok(())
    }
}

impl LayerReader for FileLayer {
    fn seek(&mut self, index: u64) -> Result<()> {
        if index >= self.width()? {
            return Err(Error::EndOfStream);
        }
        self.read_cursor = index;
        Ok(())
    }

    fn read_next(&mut self) -> Result<Node> {
        let offset = self.read_cursor * NODE_SIZE as u64;
        if offset + NODE_SIZE as u64 > self.flushed_len {
            return Err(Error::EndOfStream);
        }
        let in_buf = offset >= self.read_buf_start
            && offset + NODE_SIZE as u64 <= self.read_buf_start + self.read_buf.len() as u64;
        if !in_buf {
            self.fill_read_buf(offset)?;
        }
        let start = (offset - self.read_buf_start) as usize;
        let value = self.read_buf[start..start + NODE_SIZE].to_vec();
        self.read_cursor += 1;
        Ok(value)
    }

    fn width(&self) -> Result<u64> {
        Ok(self.flushed_len / NODE_SIZE as u64)
    }
}

impl LayerWriter for FileLayer {
    fn append(&mut self, node: &[u8]) -> Result<()> {
        // fixed-size records keep the file node-aligned
        let mut record = [0u8; NODE_SIZE];
        let n = node.len().min(NODE_SIZE);
        record[..n].copy_from_slice(&node[..n]);
        self.write_buf.extend_from_slice(&record);
        if self.write_buf.len() >= WRITE_BUF_NODES * NODE_SIZE {
            self.flush_writes()?;
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.flush_writes()?;
        self.read_cursor = 0;
        Ok(())
    }
}

impl Drop for FileLayer {
    fn drop(&mut self) {
        let _ = self.flush_writes();
    }
}
