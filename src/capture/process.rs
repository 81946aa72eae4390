//! Transcoder child process
//!
//! Runs ffmpeg (or any program writing the stream to stdout) and exposes its
//! output as a [`StreamSource`]. The child is killed when the source is
//! stopped or dropped.

use super::error::{CaptureError, CaptureResult};
use super::source::{ReaderSource, StreamSource, DEFAULT_CHUNK_SIZE};
use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::{Child, ChildStdout, Command};

/// How long to wait for the child to exit once its stdout closed
const EXIT_GRACE: Duration = Duration::from_secs(1);

/// Command line and read settings for the transcoder
#[derive(Debug, Clone)]
pub struct ProcessConfig {
    pub program: String,
    pub args: Vec<String>,
    /// Upper bound on one chunk in bytes
    pub chunk_size: usize,
    /// Delay after spawn before checking the child is still alive
    pub warmup: Duration,
}

impl ProcessConfig {
    /// Copy the input's H.264 elementary stream to stdout without re-encoding
    pub fn ffmpeg(program: impl Into<String>, input_url: impl Into<String>) -> Self {
        let args = vec![
            "-i".to_string(),
            input_url.into(),
            "-v".to_string(),
            "0".to_string(),
            "-f".to_string(),
            "h264".to_string(),
            "-c".to_string(),
            "copy".to_string(),
            "-".to_string(),
        ];

        Self {
            program: program.into(),
            args,
            chunk_size: DEFAULT_CHUNK_SIZE,
            warmup: Duration::from_millis(100),
        }
    }

    pub fn chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    pub fn warmup(mut self, warmup: Duration) -> Self {
        self.warmup = warmup;
        self
    }

    /// Command line as a single string for logging
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Stream source backed by a running child process
pub struct ProcessSource {
    child: Child,
    reader: ReaderSource<ChildStdout>,
}

impl ProcessSource {
    /// Spawn the process and wait out the warm-up delay.
    ///
    /// Fails if the process cannot be started or has already exited when
    /// the warm-up ends.
    pub async fn spawn(config: &ProcessConfig) -> CaptureResult<Self> {
        tracing::info!("Starting streamer process: {}", config.command_line());

        let mut child = Command::new(&config.program)
            .args(&config.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| CaptureError::Spawn {
                program: config.program.clone(),
                source,
            })?;

        let stdout = child.stdout.take().ok_or_else(|| {
            CaptureError::Io(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "child stdout not captured",
            ))
        })?;

        tracing::info!(
            "Streamer process started: PID {}",
            child.id().map(|id| id.to_string()).unwrap_or_default()
        );

        tokio::time::sleep(config.warmup).await;

        if let Some(status) = child.try_wait()? {
            return Err(CaptureError::ProcessExited(status.code()));
        }

        Ok(Self {
            child,
            reader: ReaderSource::with_chunk_size(stdout, config.chunk_size),
        })
    }

    /// OS process id, while the child is running
    pub fn id(&self) -> Option<u32> {
        self.child.id()
    }

    /// Kill the child and reap it
    pub async fn stop(&mut self) -> CaptureResult<()> {
        if self.child.try_wait()?.is_some() {
            return Ok(());
        }

        tracing::info!("Stopping streamer process");
        self.child.start_kill()?;
        self.child.wait().await?;
        Ok(())
    }
}

#[async_trait]
impl StreamSource for ProcessSource {
    async fn next_chunk(&mut self) -> CaptureResult<Option<Vec<u8>>> {
        match self.reader.next_chunk().await? {
            Some(chunk) => Ok(Some(chunk)),
            None => match tokio::time::timeout(EXIT_GRACE, self.child.wait()).await {
                Ok(status) => Err(CaptureError::ProcessExited(status?.code())),
                Err(_) => Ok(None),
            },
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn shell(script: &str) -> ProcessConfig {
        ProcessConfig {
            program: "sh".to_string(),
            args: vec!["-c".to_string(), script.to_string()],
            chunk_size: 1024,
            warmup: Duration::from_millis(20),
        }
    }

    #[test]
    fn test_ffmpeg_command_line() {
        let config = ProcessConfig::ffmpeg("ffmpeg", "rtsp://cam.local/stream");

        assert_eq!(
            config.command_line(),
            "ffmpeg -i rtsp://cam.local/stream -v 0 -f h264 -c copy -"
        );
        assert_eq!(config.chunk_size, DEFAULT_CHUNK_SIZE);
        assert_eq!(config.warmup, Duration::from_millis(100));
    }

    #[tokio::test]
    async fn test_spawn_missing_program() {
        let config = ProcessConfig {
            program: "/nonexistent/camrec-transcoder".to_string(),
            ..shell("")
        };

        let err = ProcessSource::spawn(&config).await.err().unwrap();
        assert!(matches!(err, CaptureError::Spawn { .. }));
    }

    #[tokio::test]
    async fn test_spawn_detects_early_exit() {
        let err = ProcessSource::spawn(&shell("exit 3")).await.err().unwrap();
        assert!(matches!(err, CaptureError::ProcessExited(Some(3))));
    }

    #[tokio::test]
    async fn test_reads_output_then_reports_exit() {
        let mut source = ProcessSource::spawn(&shell("sleep 0.2; printf abc; exit 0"))
            .await
            .unwrap();

        let mut received = Vec::new();
        let result = loop {
            match source.next_chunk().await {
                Ok(Some(chunk)) => received.extend(chunk),
                other => break other,
            }
        };

        assert_eq!(received, b"abc".to_vec());
        assert!(matches!(result, Err(CaptureError::ProcessExited(Some(0)))));
    }

    #[tokio::test]
    async fn test_stop_kills_child() {
        let mut source = ProcessSource::spawn(&shell("sleep 30")).await.unwrap();
        assert!(source.id().is_some());

        tokio::time::timeout(Duration::from_secs(5), source.stop())
            .await
            .unwrap()
            .unwrap();

        assert!(source.id().is_none());
    }
}
