//! Event persistence
//!
//! An event is an [`Excerpt`] found for an alert. The capture session hands
//! it to an [`EventSink`], which stores it durably and returns a handle to
//! the stored copy.

mod error;
mod store;

pub use error::{EventError, EventResult};
pub use store::{FileEventStore, EVENTS_DIR};

use crate::buffer::Excerpt;
use async_trait::async_trait;
use std::path::PathBuf;

/// Durable destination for found excerpts
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Store the excerpt and return a collision-free path to it.
    ///
    /// Must reject an excerpt without bytes with [`EventError::EmptyExcerpt`].
    async fn save(&self, excerpt: &Excerpt) -> EventResult<PathBuf>;
}
