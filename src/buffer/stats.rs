//! Buffer health gauges
//!
//! A point-in-time snapshot of the buffer for periodic logging. A usage
//! that stays well below 100% while the session runs means the upstream
//! stream is stalling.

use super::sliding::SlidingBuffer;
use chrono::{DateTime, Duration, Utc};

/// Snapshot of buffer gauges
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BufferStats {
    pub chunk_count: usize,
    pub size_bytes: usize,
    pub duration: Duration,
    /// Percent of the retention window covered, in `[0, 100]`
    pub usage: f64,
}

impl SlidingBuffer {
    /// Gauges measured against the wall clock
    pub fn stats(&self) -> BufferStats {
        self.stats_at(Utc::now())
    }

    pub fn stats_at(&self, now: DateTime<Utc>) -> BufferStats {
        BufferStats {
            chunk_count: self.count(),
            size_bytes: self.size(),
            duration: self.duration_at(now),
            usage: self.usage_at(now),
        }
    }
}

impl std::fmt::Display for BufferStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let seconds = self.duration.num_milliseconds() as f64 / 1000.0;
        write!(
            f,
            "chunk count {}, size {}, duration {:.3} sec (usage {:.2}%)",
            self.chunk_count, self.size_bytes, seconds, self.usage
        )
    }
}
