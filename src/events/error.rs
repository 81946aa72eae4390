//! Event store error types

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while persisting an excerpt
#[derive(Error, Debug)]
pub enum EventError {
    /// I/O operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Could not create the events directory
    #[error("Failed to create events directory {path:?}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Excerpt carried no bytes
    #[error("Empty event data")]
    EmptyExcerpt,
}

/// Result type alias for event store operations
pub type EventResult<T> = Result<T, EventError>;
