//! Sliding footage buffer
//!
//! Holds the most recent footage as one contiguous byte store plus an index
//! of [`Chunk`]s ordered by arrival. Appends go to the tail, trimming drops a
//! prefix of old chunks and physically reclaims their bytes.
//!
//! ```text
//! storage: [ c0 bytes | c1 bytes | c2 bytes | c3 bytes ]
//!            ^0         ^c1.offset
//! trim(now) with c0, c1 older than now - retention:
//! storage: [ c2 bytes | c3 bytes ]   offsets shifted down by c1.end()
//! ```
//!
//! The buffer itself is not synchronised; see
//! [`SharedBuffer`](super::SharedBuffer) for the locked wrapper.

use super::chunk::Chunk;
use chrono::{DateTime, Duration, Utc};

/// Time-bounded buffer of byte chunks
#[derive(Debug, Clone)]
pub struct SlidingBuffer {
    /// Chunk index, oldest first
    chunks: Vec<Chunk>,
    /// Contiguous storage for all indexed chunks
    data: Vec<u8>,
    /// How far back chunks are kept by `trim`
    retention: Duration,
}

impl SlidingBuffer {
    /// Create an empty buffer keeping `retention` worth of footage
    pub fn new(retention: Duration) -> Self {
        Self {
            chunks: Vec::new(),
            data: Vec::new(),
            retention,
        }
    }

    pub fn retention(&self) -> Duration {
        self.retention
    }

    /// Append one chunk at the tail.
    ///
    /// Empty data is a valid chunk. Chunks are expected in time order; a
    /// timestamp older than the current tail is raised to the tail's
    /// timestamp so the index stays sorted.
    pub fn append(&mut self, data: &[u8], timestamp: DateTime<Utc>) {
        let timestamp = match self.chunks.last() {
            Some(last) if timestamp < last.timestamp => {
                tracing::debug!(
                    "Chunk timestamp {} precedes tail {}, clamping",
                    timestamp,
                    last.timestamp
                );
                last.timestamp
            }
            _ => timestamp,
        };

        self.chunks
            .push(Chunk::new(self.data.len(), data.len(), timestamp));
        self.data.extend_from_slice(data);
    }

    /// Drop every chunk older than `now - retention` and compact storage.
    ///
    /// Returns the number of chunks removed.
    pub fn trim(&mut self, now: DateTime<Utc>) -> usize {
        // a window reaching past the representable range expires nothing
        let Some(lower_bound) = now.checked_sub_signed(self.retention) else {
            return 0;
        };

        // chunks are sorted by timestamp, so the expired ones form a prefix
        let expired = self
            .chunks
            .partition_point(|chunk| chunk.timestamp < lower_bound);

        if expired == 0 {
            return 0;
        }

        let reclaimed = self.chunks[expired - 1].end();

        self.data.drain(..reclaimed);
        self.chunks.drain(..expired);

        for chunk in &mut self.chunks {
            chunk.offset -= reclaimed;
        }

        expired
    }

    /// Drop all chunks and bytes, keeping the retention setting
    pub fn clear(&mut self) {
        self.chunks.clear();
        self.data.clear();
    }

    /// Number of indexed chunks
    pub fn count(&self) -> usize {
        self.chunks.len()
    }

    /// Total buffered bytes
    pub fn size(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Time covered by the buffered chunks, measured up to the wall clock
    pub fn duration(&self) -> Duration {
        self.duration_at(Utc::now())
    }

    /// Time covered by the buffered chunks, measured up to `now`.
    ///
    /// Each chunk contributes the gap to its successor and the last chunk
    /// the gap to `now`. The gaps telescope to `now - first.timestamp`.
    pub fn duration_at(&self, now: DateTime<Utc>) -> Duration {
        match self.chunks.first() {
            Some(first) => (now - first.timestamp).max(Duration::zero()),
            None => Duration::zero(),
        }
    }

    /// Share of the retention window currently filled, in percent
    pub fn usage(&self) -> f64 {
        self.usage_at(Utc::now())
    }

    /// Share of the retention window filled as of `now`, clamped to `[0, 100]`
    pub fn usage_at(&self, now: DateTime<Utc>) -> f64 {
        if self.chunks.is_empty() {
            return 0.0;
        }

        let retention = self.retention.num_microseconds().unwrap_or(i64::MAX);
        if retention <= 0 {
            return 100.0;
        }

        let duration = self
            .duration_at(now)
            .num_microseconds()
            .unwrap_or(i64::MAX);

        (100.0 * duration as f64 / retention as f64).clamp(0.0, 100.0)
    }

    /// Chunk index, oldest first
    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    /// Raw bytes of one indexed chunk
    pub fn chunk_data(&self, chunk: &Chunk) -> &[u8] {
        &self.data[chunk.range()]
    }

    pub(super) fn storage(&self) -> &[u8] {
        &self.data
    }
}
