//! Stream sources
//!
//! A [`StreamSource`] yields the raw transcoder output in arrival order.
//! Chunk boundaries carry no meaning beyond arrival time; whatever a single
//! read returns becomes one buffer chunk.

use super::error::CaptureResult;
use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt};

/// Default upper bound on one chunk (1 MiB)
pub const DEFAULT_CHUNK_SIZE: usize = 1024 * 1024;

/// Asynchronous producer of footage chunks
#[async_trait]
pub trait StreamSource: Send {
    /// Next chunk of bytes; `None` at end of stream
    async fn next_chunk(&mut self) -> CaptureResult<Option<Vec<u8>>>;
}

/// Chunks read from any async byte stream
pub struct ReaderSource<R> {
    reader: R,
    buf: Vec<u8>,
    total_bytes: u64,
    chunk_count: u64,
}

impl<R: AsyncRead + Unpin + Send> ReaderSource<R> {
    pub fn new(reader: R) -> Self {
        Self::with_chunk_size(reader, DEFAULT_CHUNK_SIZE)
    }

    pub fn with_chunk_size(reader: R, chunk_size: usize) -> Self {
        Self {
            reader,
            buf: vec![0u8; chunk_size.max(1)],
            total_bytes: 0,
            chunk_count: 0,
        }
    }

    /// Bytes read so far
    pub fn total_bytes(&self) -> u64 {
        self.total_bytes
    }

    /// Chunks read so far
    pub fn chunk_count(&self) -> u64 {
        self.chunk_count
    }
}

#[async_trait]
impl<R: AsyncRead + Unpin + Send> StreamSource for ReaderSource<R> {
    async fn next_chunk(&mut self) -> CaptureResult<Option<Vec<u8>>> {
        let n = self.reader.read(&mut self.buf).await?;
        if n == 0 {
            tracing::info!(
                "Stream ended (EOF) after {} chunks, {} bytes",
                self.chunk_count,
                self.total_bytes
            );
            return Ok(None);
        }

        self.total_bytes += n as u64;
        self.chunk_count += 1;

        if self.chunk_count % 100 == 0 {
            tracing::debug!(
                "Stream: {} chunks, {} bytes total",
                self.chunk_count,
                self.total_bytes
            );
        }

        Ok(Some(self.buf[..n].to_vec()))
    }
}

#[async_trait]
impl StreamSource for tokio::sync::mpsc::Receiver<Vec<u8>> {
    async fn next_chunk(&mut self) -> CaptureResult<Option<Vec<u8>>> {
        Ok(self.recv().await)
    }
}
