//! File-backed event store
//!
//! Writes each excerpt to `<root>/events/<YYYY-MM-DD_HH-MM-SS>` using the
//! alert time in the local zone. Repeated alerts for the same second get a
//! numeric suffix (`-1`, `-2`, ...). Files are opened with create-new
//! semantics, so a name is never reused even under concurrent saves.

use super::error::{EventError, EventResult};
use super::EventSink;
use crate::buffer::Excerpt;
use async_trait::async_trait;
use chrono::Local;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// Name of the subdirectory holding event files
pub const EVENTS_DIR: &str = "events";

const FILE_NAME_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

/// Persists excerpts below an explicit output directory
#[derive(Debug, Clone)]
pub struct FileEventStore {
    root: PathBuf,
}

impl FileEventStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory event files are written to
    pub fn directory(&self) -> PathBuf {
        self.root.join(EVENTS_DIR)
    }

    /// Base file name for an excerpt, without collision suffix
    pub fn base_name(excerpt: &Excerpt) -> String {
        excerpt
            .timestamp
            .with_timezone(&Local)
            .format(FILE_NAME_FORMAT)
            .to_string()
    }

    async fn ensure_directory(&self) -> EventResult<PathBuf> {
        let dir = self.directory();
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|source| EventError::CreateDir {
                path: dir.clone(),
                source,
            })?;
        Ok(dir)
    }

    async fn create_unique(dir: &Path, base: &str) -> EventResult<(PathBuf, tokio::fs::File)> {
        let mut index = 0u32;

        loop {
            let path = if index == 0 {
                dir.join(base)
            } else {
                dir.join(format!("{}-{}", base, index))
            };

            match tokio::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
            {
                Ok(file) => return Ok((path, file)),
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => index += 1,
                Err(e) => return Err(e.into()),
            }
        }
    }
}

/// Write `data` to a freshly created file, deleting the file if the write fails
async fn write_or_remove<W>(path: &Path, mut file: W, data: &[u8]) -> EventResult<()>
where
    W: AsyncWrite + Unpin,
{
    let written = match file.write_all(data).await {
        Ok(()) => file.flush().await,
        Err(e) => Err(e),
    };

    if let Err(e) = written {
        drop(file);
        if let Err(remove_err) = tokio::fs::remove_file(path).await {
            tracing::warn!("Failed to remove partial event {:?}: {}", path, remove_err);
        }
        return Err(e.into());
    }

    Ok(())
}

#[async_trait]
impl EventSink for FileEventStore {
    async fn save(&self, excerpt: &Excerpt) -> EventResult<PathBuf> {
        if excerpt.is_empty() {
            return Err(EventError::EmptyExcerpt);
        }

        let dir = self.ensure_directory().await?;
        let (path, file) = Self::create_unique(&dir, &Self::base_name(excerpt)).await?;

        write_or_remove(&path, file, &excerpt.data).await?;

        tracing::debug!("Saved {} bytes to {:?}", excerpt.len(), path);
        Ok(path)
    }
}
