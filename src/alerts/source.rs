//! Line-oriented alert source
//!
//! Reads one alert message per line from any async reader (stdin in the
//! binary). Lines without a timestamp are ignored, as are lines that do
//! not mention the configured sender when one is set. Lines are decoded
//! lossily, so a mis-encoded message is skipped like any other text
//! without a timestamp.

use super::timestamp::timestamp_from_text;
use super::{AlertResult, AlertSource};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

/// Alert source over newline-delimited text
pub struct LineAlertSource<R> {
    reader: R,
    line: Vec<u8>,
    sender: Option<String>,
}

impl<R: AsyncBufRead + Unpin> LineAlertSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: Vec::new(),
            sender: None,
        }
    }

    /// Only accept lines containing `sender`
    pub fn with_sender(mut self, sender: impl Into<String>) -> Self {
        self.sender = Some(sender.into());
        self
    }

    fn accepts(&self, line: &str) -> bool {
        match &self.sender {
            Some(sender) => line.contains(sender.as_str()),
            None => true,
        }
    }
}

#[async_trait]
impl<R: AsyncBufRead + Unpin + Send> AlertSource for LineAlertSource<R> {
    async fn next_alert(&mut self) -> AlertResult<Option<DateTime<Utc>>> {
        loop {
            self.line.clear();
            if self.reader.read_until(b'\n', &mut self.line).await? == 0 {
                return Ok(None);
            }

            let line = String::from_utf8_lossy(&self.line);
            if !self.accepts(&line) {
                tracing::debug!("Ignoring message from unexpected sender");
                continue;
            }

            if let Some(ts) = timestamp_from_text(&line) {
                return Ok(Some(ts.with_timezone(&Utc)));
            }
        }
    }
}
