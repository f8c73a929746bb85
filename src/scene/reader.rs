//! Little-endian byte cursor over an in-memory scene buffer.

use anyhow::{bail, Result};

/// Cursor with fixed-width little-endian reads and absolute seek.
/// All reads are bounds-checked; running past the buffer is a decode error.
pub struct SceneReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> SceneReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn seek(&mut self, offset: usize) {
        self.pos = offset;
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        if self.pos + n > self.buf.len() {
            bail!(
                "unexpected end of buffer at position {} (wanted {} bytes, {} available)",
                self.pos,
                n,
                self.buf.len().saturating_sub(self.pos)
            );
        }
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        let b = self.take(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    pub fn read_i16(&mut self) -> Result<i16> {
        let b = self.take(2)?;
        Ok(i16::from_le_bytes([b[0], b[1]]))
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    /// Read `n` raw bytes from the current position.
    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        self.take(n)
    }

    /// Peek a u32 at an absolute offset without moving the cursor.
    pub fn peek_u32_at(&self, offset: usize) -> Result<u32> {
        if offset + 4 > self.buf.len() {
            bail!(
                "unexpected end of buffer peeking u32 at offset {} (buffer is {} bytes)",
                offset,
                self.buf.len()
            );
        }
        let b = &self.buf[offset..offset + 4];
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }
}
