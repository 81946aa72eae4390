//! Capture session
//!
//! Ties the collaborators together for one camera:
//!
//! ```text
//! StreamSource ──ingest──▶ SharedBuffer ◀──search── alert handlers ──▶ EventSink
//!                                                        ▲
//! AlertSource ──pump──▶ mpsc channel ──dispatcher────────┘
//! ```
//!
//! Ingest runs in the caller's task. The alert pump, the dispatcher and the
//! statistics logger are spawned; each alert gets its own short-lived
//! handler task. Tasks share nothing but the buffer and the alert channel.

use super::error::{CaptureError, CaptureResult};
use super::source::StreamSource;
use crate::alerts::AlertSource;
use crate::buffer::SharedBuffer;
use crate::events::{EventResult, EventSink};
use chrono::{DateTime, Local, Utc};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Capacity of the alert channel between pump and dispatcher
const ALERT_CHANNEL_CAPACITY: usize = 64;

/// Timing settings for a capture session
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Wait between receiving an alert and searching, so footage recorded
    /// after the alert time is already buffered
    pub alert_delay: Duration,
    /// Period of the buffer statistics log line
    pub stats_interval: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            alert_delay: Duration::from_secs(20),
            stats_interval: Duration::from_secs(30),
        }
    }
}

/// One running capture: a buffer, its producer and its alert consumers
#[derive(Clone)]
pub struct CaptureSession {
    buffer: SharedBuffer,
    sink: Arc<dyn EventSink>,
    config: SessionConfig,
}

impl CaptureSession {
    pub fn new(buffer: SharedBuffer, sink: Arc<dyn EventSink>, config: SessionConfig) -> Self {
        Self {
            buffer,
            sink,
            config,
        }
    }

    pub fn buffer(&self) -> &SharedBuffer {
        &self.buffer
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Search the footage around `timestamp` and persist it if found.
    ///
    /// Returns `Ok(None)` when the buffer holds nothing around `timestamp`.
    pub async fn handle_alert(&self, timestamp: DateTime<Utc>) -> EventResult<Option<PathBuf>> {
        let Some(excerpt) = self.buffer.search(timestamp).await else {
            tracing::debug!(
                "No footage around {}",
                timestamp.with_timezone(&Local).to_rfc2822()
            );
            return Ok(None);
        };

        let path = self.sink.save(&excerpt).await?;
        tracing::info!("Saved event ({} bytes) to {:?}", excerpt.len(), path);
        Ok(Some(path))
    }

    /// Move chunks from `source` into the buffer until cancelled.
    ///
    /// End of stream is an error: the session cannot continue without it.
    pub async fn ingest<S>(&self, source: &mut S, cancel: &CancellationToken) -> CaptureResult<()>
    where
        S: StreamSource + ?Sized,
    {
        loop {
            let chunk = tokio::select! {
                _ = cancel.cancelled() => return Ok(()),
                chunk = source.next_chunk() => chunk?,
            };

            match chunk {
                Some(data) => self.buffer.ingest(&data, Utc::now()).await,
                None => return Err(CaptureError::StreamEnded),
            }
        }
    }

    /// Run the session until `cancel` fires or a fatal error occurs.
    ///
    /// Returns `Ok(())` on cancellation. Exhausting the alert source is not
    /// fatal; ingest keeps running. Alert handlers still in flight are not
    /// awaited.
    pub async fn run<S, A>(
        &self,
        source: &mut S,
        alerts: A,
        cancel: CancellationToken,
    ) -> CaptureResult<()>
    where
        S: StreamSource + ?Sized,
        A: AlertSource + 'static,
    {
        let session_cancel = cancel.child_token();
        let (tx, rx) = mpsc::channel(ALERT_CHANNEL_CAPACITY);

        let pump = tokio::spawn(pump_alerts(alerts, tx, session_cancel.clone()));
        let dispatcher = self.spawn_dispatcher(rx, session_cancel.clone());
        let statistics = self.spawn_statistics(session_cancel.clone());

        tracing::info!("Capture session started");

        let ingest_result = self.ingest(source, &session_cancel).await;
        session_cancel.cancel();

        let pump_result = pump.await;
        for handle in [dispatcher, statistics] {
            if let Err(e) = handle.await {
                tracing::warn!("Session task ended abnormally: {}", e);
            }
        }

        tracing::info!("Capture session stopped");

        ingest_result?;
        match pump_result {
            Ok(result) => result,
            Err(e) => Err(CaptureError::Task(e.to_string())),
        }
    }

    fn spawn_dispatcher(
        &self,
        mut rx: mpsc::Receiver<DateTime<Utc>>,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        let session = self.clone();

        tokio::spawn(async move {
            loop {
                let timestamp = tokio::select! {
                    _ = cancel.cancelled() => break,
                    ts = rx.recv() => match ts {
                        Some(ts) => ts,
                        None => break,
                    },
                };

                tracing::info!(
                    "Alert received: {}",
                    timestamp.with_timezone(&Local).to_rfc2822()
                );

                let session = session.clone();
                let cancel = cancel.clone();
                tokio::spawn(async move {
                    tokio::select! {
                        _ = cancel.cancelled() => return,
                        _ = tokio::time::sleep(session.config.alert_delay) => {}
                    }

                    tracing::info!(
                        "Handle timestamp: {}",
                        timestamp.with_timezone(&Local).to_rfc2822()
                    );

                    if let Err(e) = session.handle_alert(timestamp).await {
                        tracing::error!("Event save failed: {}", e);
                    }
                });
            }
        })
    }

    fn spawn_statistics(&self, cancel: CancellationToken) -> JoinHandle<()> {
        let buffer = self.buffer.clone();
        let period = self.config.stats_interval;

        tokio::spawn(async move {
            let start = tokio::time::Instant::now() + period;
            let mut ticker = tokio::time::interval_at(start, period);

            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        tracing::info!("{}", buffer.stats().await);
                    }
                }
            }
        })
    }
}

/// Forward alerts into the channel until the source ends or fails
async fn pump_alerts<A: AlertSource>(
    mut alerts: A,
    tx: mpsc::Sender<DateTime<Utc>>,
    cancel: CancellationToken,
) -> CaptureResult<()> {
    tracing::info!("Start alert loop");

    loop {
        let next = tokio::select! {
            _ = cancel.cancelled() => return Ok(()),
            next = alerts.next_alert() => next,
        };

        match next {
            Ok(Some(ts)) => {
                if tx.send(ts).await.is_err() {
                    return Ok(());
                }
            }
            Ok(None) => {
                tracing::info!("Alert source exhausted");
                return Ok(());
            }
            Err(e) => {
                tracing::error!("Alert loop end: {}", e);
                cancel.cancel();
                return Err(e.into());
            }
        }
    }
}
