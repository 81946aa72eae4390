//! Lock-guarded buffer shared between the ingest task and alert handlers
//!
//! Every operation takes the same exclusive lock for its whole duration, so a
//! search never observes the buffer mid-compaction. All operations are
//! bounded by the retained window, which keeps lock hold times short.

use super::search::Excerpt;
use super::sliding::SlidingBuffer;
use super::stats::BufferStats;
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Cloneable handle to one session's [`SlidingBuffer`]
#[derive(Debug, Clone)]
pub struct SharedBuffer {
    inner: Arc<Mutex<SlidingBuffer>>,
}

impl SharedBuffer {
    pub fn new(retention: Duration) -> Self {
        Self::from_buffer(SlidingBuffer::new(retention))
    }

    pub fn from_buffer(buffer: SlidingBuffer) -> Self {
        Self {
            inner: Arc::new(Mutex::new(buffer)),
        }
    }

    /// Trim expired chunks, then append `data`, under one lock acquisition
    pub async fn ingest(&self, data: &[u8], now: DateTime<Utc>) {
        let mut buffer = self.inner.lock().await;
        let removed = buffer.trim(now);
        if removed > 0 {
            tracing::trace!("Trimmed {} expired chunks", removed);
        }
        buffer.append(data, now);
    }

    pub async fn append(&self, data: &[u8], timestamp: DateTime<Utc>) {
        self.inner.lock().await.append(data, timestamp);
    }

    pub async fn trim(&self, now: DateTime<Utc>) -> usize {
        self.inner.lock().await.trim(now)
    }

    pub async fn clear(&self) {
        self.inner.lock().await.clear();
    }

    pub async fn search(&self, timestamp: DateTime<Utc>) -> Option<Excerpt> {
        self.inner.lock().await.search(timestamp)
    }

    pub async fn stats(&self) -> BufferStats {
        self.inner.lock().await.stats()
    }

    pub async fn count(&self) -> usize {
        self.inner.lock().await.count()
    }

    pub async fn size(&self) -> usize {
        self.inner.lock().await.size()
    }

    pub async fn duration(&self) -> Duration {
        self.inner.lock().await.duration()
    }

    pub async fn usage(&self) -> f64 {
        self.inner.lock().await.usage()
    }
}
