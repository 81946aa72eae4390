//! # camrec
//!
//! Continuous security-camera capture with alert-triggered event extraction.
//!
//! An ffmpeg process copies the camera stream to stdout; the most recent
//! footage is kept in a rolling in-memory buffer. When a motion alert with a
//! timestamp arrives, the footage around that time is copied out of the
//! buffer and written to disk.
//!
//! ## Modules
//!
//! - [`buffer`]: Rolling footage buffer, lookup and statistics
//! - [`capture`]: Stream sources and the capture session
//! - [`alerts`]: Alert sources and timestamp parsing
//! - [`events`]: Persistence of found footage
//! - [`config`]: TOML configuration with environment overrides
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use camrec::{CaptureSession, FileEventStore, LineAlertSource, ProcessConfig, ProcessSource,
//!     SessionConfig, SharedBuffer};
//! use chrono::Duration;
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let buffer = SharedBuffer::new(Duration::seconds(120));
//!     let store = Arc::new(FileEventStore::new("/var/lib/camrec"));
//!     let session = CaptureSession::new(buffer, store, SessionConfig::default());
//!
//!     let mut source = ProcessSource::spawn(&ProcessConfig::ffmpeg(
//!         "ffmpeg",
//!         "rtsp://192.168.1.10:554/stream",
//!     ))
//!     .await?;
//!     let alerts = LineAlertSource::new(tokio::io::BufReader::new(tokio::io::stdin()));
//!
//!     session.run(&mut source, alerts, CancellationToken::new()).await?;
//!     source.stop().await?;
//!
//!     Ok(())
//! }
//! ```

pub mod alerts;
pub mod buffer;
pub mod capture;
pub mod config;
pub mod events;

// Re-export top-level types for convenience
pub use buffer::{BufferStats, Chunk, Excerpt, SharedBuffer, SlidingBuffer};

pub use capture::{
    CaptureError, CaptureResult, CaptureSession, ProcessConfig, ProcessSource, ReaderSource,
    SessionConfig, StreamSource,
};

pub use alerts::{AlertError, AlertResult, AlertSource, LineAlertSource};

pub use events::{EventError, EventResult, EventSink, FileEventStore};

pub use config::{Config, ConfigError, LoggingConfig};
