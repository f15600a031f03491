//! A non-owning forward reader over the raw file bytes.
//!
//! The original implementation this crate's behaviour is modelled on repeatedly
//! erased consumed bytes from the front of a growable buffer, which is quadratic
//! in the file size. This cursor instead advances an integer offset over a
//! borrowed slice; semantics (what gets consumed, in what order) are identical,
//! the cost is not.

use crate::error::{DecodeError, Result};

pub struct ByteCursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteCursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        ByteCursor { data, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Returns the next `n` bytes without advancing the cursor.
    pub fn peek(&self, n: usize) -> Result<&'a [u8]> {
        if self.remaining() < n {
            return Err(DecodeError::Truncated {
                needed: n - self.remaining(),
            });
        }
        Ok(&self.data[self.pos..self.pos + n])
    }

    /// Returns the next `n` bytes and advances the cursor past them.
    pub fn consume(&mut self, n: usize) -> Result<&'a [u8]> {
        let slice = self.peek(n)?;
        self.pos += n;
        Ok(slice)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.consume(1)?[0])
    }

    pub fn read_u16_be(&mut self) -> Result<u16> {
        let b = self.consume(2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    pub fn read_u32_be(&mut self) -> Result<u32> {
        let b = self.consume(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }
}
