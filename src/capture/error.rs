//! Capture session error types
//!
//! Every variant here is fatal to the session that raised it. A search
//! miss is not an error and persistence failures are only logged.

use crate::alerts::AlertError;
use thiserror::Error;

/// Errors that stop a capture session
#[derive(Error, Debug)]
pub enum CaptureError {
    /// Reading the stream failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The transcoder could not be started
    #[error("Failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    /// The transcoder exited
    #[error("Process exited with code {}", .0.map(|c| c.to_string()).unwrap_or_else(|| "unknown".to_string()))]
    ProcessExited(Option<i32>),

    /// The stream reached end of input
    #[error("Stream ended")]
    StreamEnded,

    /// The alert source failed
    #[error("Alert source error: {0}")]
    Alert(#[from] AlertError),

    /// A session task panicked or was aborted
    #[error("Task failed: {0}")]
    Task(String),
}

/// Result type alias for capture operations
pub type CaptureResult<T> = Result<T, CaptureError>;
