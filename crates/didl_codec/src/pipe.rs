//! Growable cursor-based byte buffer
//!
//! Writes append at the end, reads consume from the front. Encoding and
//! decoding share the same buffer type so value codecs can be written once.

use crate::{Error, Result};

/// Minimum capacity of a fresh pipe
const MIN_CAPACITY: usize = 64;

/// Byte stream with a read cursor
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pipe {
    /// Written bytes
    buffer: Vec<u8>,
    /// Current read position
    offset: usize,
}

impl Pipe {
    /// Create an empty pipe
    pub fn new() -> Self {
        Self::with_capacity(MIN_CAPACITY)
    }

    /// Create an empty pipe with pre-allocated capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(capacity),
            offset: 0,
        }
    }

    /// Create a pipe positioned at the start of `bytes`
    pub fn from_slice(bytes: &[u8]) -> Self {
        Self {
            buffer: bytes.to_vec(),
            offset: 0,
        }
    }

    /// Consume the next `n` bytes
    pub fn read(&mut self, n: usize) -> Result<&[u8]> {
        let available = self.remaining();
        if available < n {
            return Err(Error::EndOfBuffer {
                needed: n,
                available,
            });
        }
        let start = self.offset;
        self.offset += n;
        Ok(&self.buffer[start..self.offset])
    }

    /// Consume the next byte
    pub fn read_byte(&mut self) -> Result<u8> {
        Ok(self.read(1)?[0])
    }

    /// Look at the next byte without consuming it
    pub fn peek_byte(&self) -> Option<u8> {
        self.buffer.get(self.offset).copied()
    }

    /// Append bytes, growing capacity by ~1.2x when full
    pub fn write(&mut self, bytes: &[u8]) {
        self.reserve(bytes.len());
        self.buffer.extend_from_slice(bytes);
    }

    /// Append a single byte
    pub fn write_byte(&mut self, byte: u8) {
        self.reserve(1);
        self.buffer.push(byte);
    }

    fn reserve(&mut self, additional: usize) {
        let needed = self.buffer.len() + additional;
        let capacity = self.buffer.capacity();
        if needed > capacity {
            let grown = (capacity + capacity / 5).max(MIN_CAPACITY).max(needed);
            self.buffer.reserve_exact(grown - self.buffer.len());
        }
    }

    /// Unread length
    pub fn remaining(&self) -> usize {
        self.buffer.len() - self.offset
    }

    /// True once every written byte has been read
    pub fn is_exhausted(&self) -> bool {
        self.remaining() == 0
    }

    /// Bytes consumed so far
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Unread bytes
    pub fn as_slice(&self) -> &[u8] {
        &self.buffer[self.offset..]
    }

    /// Take the unread bytes
    pub fn into_vec(mut self) -> Vec<u8> {
        if self.offset > 0 {
            self.buffer.drain(..self.offset);
        }
        self.buffer
    }
}

impl From<Vec<u8>> for Pipe {
    fn from(buffer: Vec<u8>) -> Self {
        Self { buffer, offset: 0 }
    }
}
