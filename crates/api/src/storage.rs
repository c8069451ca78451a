//! Local disk storage for video files.
//!
//! Uploads are first written to `<staging>/<uuid>` while the request is
//! being read. The staging directory lives outside the publicly served
//! root. Once the database row exists they are moved to
//! `<root>/<video_id>/<uuid>.<ext>` and only the file name is stored on the
//! row. Staged files that are never placed are removed when dropped.

use std::path::{Path, PathBuf};

use catalog_core::types::DbId;
use tokio::io::AsyncWriteExt;

use crate::config::StorageConfig;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> StorageError + '_ {
    move |source| StorageError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Video file storage rooted at a single directory.
#[derive(Debug, Clone)]
pub struct VideoStorage {
    root: PathBuf,
    staging: PathBuf,
    public_url: String,
}

impl VideoStorage {
    pub fn new(config: &StorageConfig) -> Self {
        Self {
            root: config.root.clone(),
            staging: config.staging.clone(),
            public_url: config.public_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn staging_dir(&self) -> &Path {
        &self.staging
    }

    fn video_dir(&self, video_id: DbId) -> PathBuf {
        self.root.join(video_id.to_string())
    }

    /// Path of a stored file.
    pub fn path_for(&self, video_id: DbId, name: &str) -> PathBuf {
        self.video_dir(video_id).join(name)
    }

    /// Public URL of a stored file.
    pub fn url_for(&self, video_id: DbId, name: &str) -> String {
        format!("{}/{video_id}/{name}", self.public_url)
    }

    /// Open a new empty staging file.
    pub async fn stage(&self, extension: Option<String>) -> Result<StagedFile, StorageError> {
        let dir = &self.staging;
        tokio::fs::create_dir_all(dir).await.map_err(io_err(dir))?;

        let path = dir.join(uuid::Uuid::new_v4().to_string());
        let file = tokio::fs::File::create(&path)
            .await
            .map_err(io_err(&path))?;

        Ok(StagedFile {
            path,
            file: Some(file),
            extension,
            size: 0,
            placed: false,
        })
    }

    /// Move a staged file into the video's directory under a fresh name.
    ///
    /// Returns the stored file name.
    pub async fn place(&self, video_id: DbId, mut staged: StagedFile) -> Result<String, StorageError> {
        staged.close().await?;

        let dir = self.video_dir(video_id);
        tokio::fs::create_dir_all(&dir).await.map_err(io_err(&dir))?;

        let name = match &staged.extension {
            Some(ext) => format!("{}.{ext}", uuid::Uuid::new_v4()),
            None => uuid::Uuid::new_v4().to_string(),
        };
        let dest = dir.join(&name);
        tokio::fs::rename(&staged.path, &dest)
            .await
            .map_err(io_err(&dest))?;
        staged.placed = true;

        Ok(name)
    }

    /// Remove stored files, logging (not failing on) anything that cannot
    /// be removed.
    pub async fn remove_files(&self, video_id: DbId, names: &[String]) {
        for name in names {
            let path = self.path_for(video_id, name);
            match tokio::fs::remove_file(&path).await {
                Ok(()) => tracing::debug!(path = %path.display(), "Removed video file"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Failed to remove video file")
                }
            }
        }
    }

    /// Remove a video's directory and everything in it.
    pub async fn remove_video_dir(&self, video_id: DbId) {
        let dir = self.video_dir(video_id);
        match tokio::fs::remove_dir_all(&dir).await {
            Ok(()) => tracing::debug!(dir = %dir.display(), "Removed video directory"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(dir = %dir.display(), error = %e, "Failed to remove video directory")
            }
        }
    }
}

/// An upload being received, held in the staging directory.
#[derive(Debug)]
pub struct StagedFile {
    path: PathBuf,
    file: Option<tokio::fs::File>,
    extension: Option<String>,
    size: u64,
    placed: bool,
}

impl StagedFile {
    /// Bytes written so far.
    pub fn size(&self) -> u64 {
        self.size
    }

    pub async fn write_chunk(&mut self, chunk: &[u8]) -> Result<(), StorageError> {
        if let Some(file) = self.file.as_mut() {
            file.write_all(chunk).await.map_err(io_err(&self.path))?;
        }
        self.size += chunk.len() as u64;
        Ok(())
    }

    async fn close(&mut self) -> Result<(), StorageError> {
        if let Some(mut file) = self.file.take() {
            file.flush().await.map_err(io_err(&self.path))?;
        }
        Ok(())
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        if !self.placed {
            drop(self.file.take());
            let _ = std::fs::remove_file(&self.path);
        }
    }
}

/// Lower-cased extension of a client file name, if it has a sane one.
pub fn extension_of(file_name: &str) -> Option<String> {
    let (_, ext) = file_name.rsplit_once('.')?;
    let ext = ext.to_ascii_lowercase();
    if ext.is_empty() || ext.len() > 10 || !ext.bytes().all(|b| b.is_ascii_alphanumeric()) {
        return None;
    }
    Some(ext)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
