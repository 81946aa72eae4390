//! Rolling footage buffer
//!
//! This module keeps the last N seconds of the camera stream in memory:
//!
//! - **chunk**: Per-append index entry (offset, length, timestamp)
//! - **sliding**: The buffer itself: append, trim, clear, gauges
//! - **search**: Point-in-time lookup returning an owned [`Excerpt`]
//! - **stats**: Health gauges for periodic logging
//! - **shared**: Single-lock wrapper shared by ingest and alert handlers
//!
//! # Example
//!
//! ```rust
//! use camrec::buffer::SlidingBuffer;
//! use chrono::{Duration, Utc};
//!
//! let mut buffer = SlidingBuffer::new(Duration::seconds(120));
//! let now = Utc::now();
//!
//! buffer.append(&[1, 2], now - Duration::seconds(10));
//! buffer.append(&[3], now);
//! buffer.trim(now);
//!
//! let excerpt = buffer.search(now - Duration::seconds(5)).unwrap();
//! assert_eq!(excerpt.data, vec![1, 2, 3]);
//! ```

pub mod chunk;
pub mod search;
pub mod shared;
pub mod sliding;
pub mod stats;

pub use chunk::Chunk;
pub use search::Excerpt;
pub use shared::SharedBuffer;
pub use sliding::SlidingBuffer;
pub use stats::BufferStats;
