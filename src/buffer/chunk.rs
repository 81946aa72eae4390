//! Chunk index entries
//!
//! A `Chunk` records where one append landed inside the contiguous byte
//! store of a [`SlidingBuffer`](super::SlidingBuffer) and when it arrived.
//! The data itself lives in the buffer, never in the chunk.

use chrono::{DateTime, Local, Utc};

/// Position, length and arrival time of one appended piece of footage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk {
    /// Byte offset within the buffer's storage
    pub offset: usize,
    /// Number of bytes belonging to this chunk
    pub length: usize,
    /// Arrival time
    pub timestamp: DateTime<Utc>,
}

impl Chunk {
    pub fn new(offset: usize, length: usize, timestamp: DateTime<Utc>) -> Self {
        Self {
            offset,
            length,
            timestamp,
        }
    }

    /// Offset one past the last byte of this chunk
    pub fn end(&self) -> usize {
        self.offset + self.length
    }

    /// Byte range of this chunk within storage
    pub fn range(&self) -> std::ops::Range<usize> {
        self.offset..self.end()
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }
}

impl std::fmt::Display for Chunk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: {} bytes",
            self.timestamp.with_timezone(&Local).format("%d.%m.%Y %H:%M:%S"),
            self.length
        )
    }
}
