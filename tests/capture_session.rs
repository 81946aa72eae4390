//! End-to-end tests for a capture session: chunks in, alerts in, events out.

use async_trait::async_trait;
use camrec::alerts::AlertError;
use camrec::{
    CaptureError, CaptureSession, EventResult, EventSink, Excerpt, FileEventStore,
    LineAlertSource, ReaderSource, SessionConfig, SharedBuffer,
};
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;

fn fast_config() -> SessionConfig {
    SessionConfig {
        alert_delay: Duration::from_millis(50),
        stats_interval: Duration::from_millis(20),
    }
}

#[derive(Default)]
struct RecordingSink {
    saved: Mutex<Vec<Excerpt>>,
}

#[async_trait]
impl EventSink for RecordingSink {
    async fn save(&self, excerpt: &Excerpt) -> EventResult<PathBuf> {
        let mut saved = self.saved.lock().await;
        saved.push(excerpt.clone());
        Ok(PathBuf::from(format!("event-{}", saved.len())))
    }
}

struct FailingSink;

#[async_trait]
impl EventSink for FailingSink {
    async fn save(&self, _excerpt: &Excerpt) -> EventResult<PathBuf> {
        Err(std::io::Error::new(std::io::ErrorKind::Other, "disk full").into())
    }
}

struct BrokenAlerts;

#[async_trait]
impl camrec::AlertSource for BrokenAlerts {
    async fn next_alert(&mut self) -> camrec::AlertResult<Option<DateTime<Utc>>> {
        Err(AlertError::Io(std::io::Error::new(
            std::io::ErrorKind::ConnectionReset,
            "inbox gone",
        )))
    }
}

async fn wait_for<F, Fut>(mut check: F)
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    for _ in 0..100 {
        if check().await {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not reached in time");
}

#[tokio::test]
async fn alert_between_chunks_saves_both_chunks() {
    let sink = Arc::new(RecordingSink::default());
    let session = CaptureSession::new(
        SharedBuffer::new(chrono::Duration::seconds(60)),
        sink.clone(),
        fast_config(),
    );

    let (chunk_tx, mut chunk_rx) = mpsc::channel::<Vec<u8>>(8);
    let (alert_tx, alert_rx) = mpsc::channel::<DateTime<Utc>>(8);
    let cancel = CancellationToken::new();

    let run = {
        let session = session.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move { session.run(&mut chunk_rx, alert_rx, cancel).await })
    };

    chunk_tx.send(vec![1, 1, 1]).await.unwrap();
    tokio::time::sleep(Duration::from_millis(20)).await;
    let alert_time = Utc::now();
    tokio::time::sleep(Duration::from_millis(20)).await;
    chunk_tx.send(vec![2, 2]).await.unwrap();
    alert_tx.send(alert_time).await.unwrap();

    wait_for(|| {
        let sink = sink.clone();
        async move { !sink.saved.lock().await.is_empty() }
    })
    .await;

    cancel.cancel();
    run.await.unwrap().unwrap();

    let saved = sink.saved.lock().await;
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].timestamp, alert_time);
    assert_eq!(saved[0].data, vec![1, 1, 1, 2, 2]);
}

#[tokio::test]
async fn alert_outside_window_saves_nothing() {
    let sink = Arc::new(RecordingSink::default());
    let session = CaptureSession::new(
        SharedBuffer::new(chrono::Duration::seconds(60)),
        sink.clone(),
        fast_config(),
    );

    let (chunk_tx, mut chunk_rx) = mpsc::channel::<Vec<u8>>(8);
    let (alert_tx, alert_rx) = mpsc::channel::<DateTime<Utc>>(8);
    let cancel = CancellationToken::new();

    let run = {
        let session = session.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move { session.run(&mut chunk_rx, alert_rx, cancel).await })
    };

    chunk_tx.send(vec![1]).await.unwrap();
    chunk_tx.send(vec![2]).await.unwrap();
    alert_tx
        .send(Utc::now() - chrono::Duration::hours(1))
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_millis(150)).await;
    cancel.cancel();
    run.await.unwrap().unwrap();

    assert!(sink.saved.lock().await.is_empty());
    assert_eq!(session.buffer().count().await, 2);
}

#[tokio::test]
async fn persistence_failure_keeps_ingesting() {
    let session = CaptureSession::new(
        SharedBuffer::new(chrono::Duration::seconds(60)),
        Arc::new(FailingSink),
        fast_config(),
    );

    let (chunk_tx, mut chunk_rx) = mpsc::channel::<Vec<u8>>(8);
    let (alert_tx, alert_rx) = mpsc::channel::<DateTime<Utc>>(8);
    let cancel = CancellationToken::new();

    let run = {
        let session = session.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move { session.run(&mut chunk_rx, alert_rx, cancel).await })
    };

    chunk_tx.send(vec![1]).await.unwrap();
    tokio::time::sleep(Duration::from_millis(10)).await;
    let alert_time = Utc::now();
    tokio::time::sleep(Duration::from_millis(10)).await;
    chunk_tx.send(vec![2]).await.unwrap();
    alert_tx.send(alert_time).await.unwrap();

    tokio::time::sleep(Duration::from_millis(150)).await;
    chunk_tx.send(vec![3]).await.unwrap();

    wait_for(|| {
        let session = session.clone();
        async move { session.buffer().count().await == 3 }
    })
    .await;

    cancel.cancel();
    run.await.unwrap().unwrap();
}

#[tokio::test]
async fn stream_end_stops_session() {
    let session = CaptureSession::new(
        SharedBuffer::new(chrono::Duration::seconds(60)),
        Arc::new(RecordingSink::default()),
        fast_config(),
    );

    let footage: Vec<u8> = (0..=255).collect();
    let mut source = ReaderSource::with_chunk_size(&footage[..], 64);
    let (_alert_tx, alert_rx) = mpsc::channel::<DateTime<Utc>>(1);

    let err = session
        .run(&mut source, alert_rx, CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, CaptureError::StreamEnded));
    assert_eq!(session.buffer().size().await, 256);
    assert_eq!(session.buffer().count().await, 4);
}

#[tokio::test]
async fn alert_source_failure_stops_session() {
    let session = CaptureSession::new(
        SharedBuffer::new(chrono::Duration::seconds(60)),
        Arc::new(RecordingSink::default()),
        fast_config(),
    );

    let (_chunk_tx, mut chunk_rx) = mpsc::channel::<Vec<u8>>(1);

    let result = tokio::time::timeout(
        Duration::from_secs(5),
        session.run(&mut chunk_rx, BrokenAlerts, CancellationToken::new()),
    )
    .await
    .unwrap();

    assert!(matches!(result, Err(CaptureError::Alert(AlertError::Io(_)))));
}

#[tokio::test]
async fn exhausted_alert_source_is_not_fatal() {
    let session = CaptureSession::new(
        SharedBuffer::new(chrono::Duration::seconds(60)),
        Arc::new(RecordingSink::default()),
        fast_config(),
    );

    let (chunk_tx, mut chunk_rx) = mpsc::channel::<Vec<u8>>(8);
    let alerts = LineAlertSource::new(tokio::io::BufReader::new(&b""[..]));
    let cancel = CancellationToken::new();

    let run = {
        let session = session.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move { session.run(&mut chunk_rx, alerts, cancel).await })
    };

    tokio::time::sleep(Duration::from_millis(50)).await;
    chunk_tx.send(vec![7, 7]).await.unwrap();

    wait_for(|| {
        let session = session.clone();
        async move { session.buffer().size().await == 2 }
    })
    .await;

    assert!(!run.is_finished());
    cancel.cancel();
    run.await.unwrap().unwrap();
}

#[tokio::test]
async fn mis_encoded_alert_does_not_stop_session() {
    let sink = Arc::new(RecordingSink::default());
    let session = CaptureSession::new(
        SharedBuffer::new(chrono::Duration::seconds(60)),
        sink.clone(),
        fast_config(),
    );

    let (chunk_tx, mut chunk_rx) = mpsc::channel::<Vec<u8>>(8);
    let alerts = LineAlertSource::new(tokio::io::BufReader::new(
        &b"\xcf\xf0\xe8\xe2\xe5\xf2 motion\n"[..],
    ));
    let cancel = CancellationToken::new();

    let run = {
        let session = session.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move { session.run(&mut chunk_rx, alerts, cancel).await })
    };

    tokio::time::sleep(Duration::from_millis(50)).await;
    chunk_tx.send(vec![3, 3, 3]).await.unwrap();

    wait_for(|| {
        let session = session.clone();
        async move { session.buffer().size().await == 3 }
    })
    .await;

    assert!(!run.is_finished());
    cancel.cancel();
    run.await.unwrap().unwrap();
    assert!(sink.saved.lock().await.is_empty());
}

#[tokio::test]
async fn cancellation_does_not_wait_for_pending_alerts() {
    let session = CaptureSession::new(
        SharedBuffer::new(chrono::Duration::seconds(60)),
        Arc::new(RecordingSink::default()),
        SessionConfig {
            alert_delay: Duration::from_secs(3600),
            stats_interval: Duration::from_secs(3600),
        },
    );

    let (_chunk_tx, mut chunk_rx) = mpsc::channel::<Vec<u8>>(1);
    let (alert_tx, alert_rx) = mpsc::channel::<DateTime<Utc>>(1);
    let cancel = CancellationToken::new();

    let run = {
        let session = session.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move { session.run(&mut chunk_rx, alert_rx, cancel).await })
    };

    alert_tx.send(Utc::now()).await.unwrap();
    tokio::time::sleep(Duration::from_millis(20)).await;
    cancel.cancel();

    tokio::time::timeout(Duration::from_secs(2), run)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
}

#[tokio::test]
async fn saves_events_to_disk() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(FileEventStore::new(dir.path()));
    let session = CaptureSession::new(
        SharedBuffer::new(chrono::Duration::seconds(60)),
        store.clone(),
        fast_config(),
    );

    let now = Utc::now();
    session
        .buffer()
        .append(b"frame-a", now - chrono::Duration::seconds(2))
        .await;
    session.buffer().append(b"frame-b", now).await;

    let path = session
        .handle_alert(now - chrono::Duration::seconds(1))
        .await
        .unwrap()
        .unwrap();

    assert!(path.starts_with(store.directory()));
    assert_eq!(std::fs::read(&path).unwrap(), b"frame-aframe-b".to_vec());
}
