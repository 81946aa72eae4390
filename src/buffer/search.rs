//! Footage lookup
//!
//! Answers "what footage surrounds timestamp T" against a [`SlidingBuffer`].
//!
//! The bracket is the pair of chunks around T: the last chunk stamped at or
//! before T and the first chunk stamped strictly after it. Both chunks are
//! adjacent in storage, so the excerpt is a single copied slice.
//!
//! ```text
//! chunks:   [1]@-60s  [2]@-45s  [3]@-30s  [4]@-15s  [5]@0s
//! search(-40s)            ^---------^     -> bytes of [2] ++ [3]
//! ```
//!
//! Timestamps outside `[first, last]` are a miss, as is a timestamp equal to
//! the newest chunk, which has no successor yet.

use super::sliding::SlidingBuffer;
use chrono::{DateTime, Utc};

/// Footage extracted around an alert timestamp.
///
/// Owns its bytes; later buffer mutation never affects it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Excerpt {
    /// The queried timestamp
    pub timestamp: DateTime<Utc>,
    /// Copied footage bytes
    pub data: Vec<u8>,
}

impl Excerpt {
    pub fn new(timestamp: DateTime<Utc>, data: Vec<u8>) -> Self {
        Self { timestamp, data }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }
}

impl SlidingBuffer {
    /// Find the footage bracketing `timestamp`.
    ///
    /// Returns `None` when the buffer is empty or `timestamp` lies outside
    /// the retained window.
    pub fn search(&self, timestamp: DateTime<Utc>) -> Option<Excerpt> {
        let chunks = self.chunks();
        let (first, last) = (chunks.first()?, chunks.last()?);

        if timestamp < first.timestamp || timestamp > last.timestamp {
            return None;
        }

        let after = chunks.partition_point(|chunk| chunk.timestamp <= timestamp);
        if after == 0 || after == chunks.len() {
            return None;
        }

        let start = chunks[after - 1].offset;
        let end = chunks[after].end();

        Some(Excerpt::new(timestamp, self.storage()[start..end].to_vec()))
    }
}
