//! Motion alerts
//!
//! An alert is an instant meaning "inspect footage around this time". The
//! session pulls alerts from an [`AlertSource`] and forwards them over a
//! channel to the alert handlers.

mod source;
pub mod timestamp;

pub use source::LineAlertSource;
pub use timestamp::{extract_timestamp, parse_timestamp, timestamp_from_text};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors raised by alert sources
#[derive(Error, Debug)]
pub enum AlertError {
    /// Reading from the underlying transport failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Timestamp text could not be turned into an instant
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),
}

/// Result type alias for alert operations
pub type AlertResult<T> = Result<T, AlertError>;

/// Asynchronous producer of alert instants
#[async_trait]
pub trait AlertSource: Send {
    /// Wait for the next alert; `None` once the source is exhausted
    async fn next_alert(&mut self) -> AlertResult<Option<DateTime<Utc>>>;
}

#[async_trait]
impl AlertSource for tokio::sync::mpsc::Receiver<DateTime<Utc>> {
    async fn next_alert(&mut self) -> AlertResult<Option<DateTime<Utc>>> {
        Ok(self.recv().await)
    }
}
