//! Footage capture
//!
//! - **source**: The [`StreamSource`] trait and a reader-backed implementation
//! - **process**: Transcoder child process (ffmpeg) as a stream source
//! - **session**: Ingest loop, alert handling and statistics for one camera
//! - **error**: Session-fatal errors

mod error;
mod process;
mod session;
mod source;

pub use error::{CaptureError, CaptureResult};
pub use process::{ProcessConfig, ProcessSource};
pub use session::{CaptureSession, SessionConfig};
pub use source::{ReaderSource, StreamSource, DEFAULT_CHUNK_SIZE};
