//! Artifact storage for generated images.
//!
//! Uploads are first staged under a private directory with a timestamped,
//! whitespace-free name that also carries a random token, so concurrent
//! uploads of the same file never share a path. A successful generation
//! then copies the staged bytes into the public uploads directory and hands
//! back the root-relative URL it is served from.

use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};

use regex::Regex;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::clock::{Clock, SystemClock};

/// URL prefix under which the uploads directory is served.
pub const PUBLIC_UPLOADS_PREFIX: &str = "/uploads";

/// Basename used when the client sends a file without a usable name.
const FALLBACK_BASENAME: &str = "image";

static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Failed to copy artifact to {}: {source}", .path.display())]
    Copy {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to stage upload at {}: {source}", .path.display())]
    Stage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Reduce a client-supplied filename to its basename with every whitespace
/// run replaced by a single underscore.
pub fn sanitize_filename(name: &str) -> String {
    let basename = Path::new(name)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let sanitized = WHITESPACE_RUN.replace_all(&basename, "_").into_owned();
    if sanitized.is_empty() {
        FALLBACK_BASENAME.to_string()
    } else {
        sanitized
    }
}

/// Build `{epoch_millis}-{sanitized basename}`.
pub fn timestamped_filename(epoch_millis: i64, original_filename: &str) -> String {
    format!("{epoch_millis}-{}", sanitize_filename(original_filename))
}

/// Build `{epoch_millis}-{token}-{sanitized basename}` for a staged upload.
pub fn staged_filename(epoch_millis: i64, token: Uuid, original_filename: &str) -> String {
    format!("{epoch_millis}-{}-{}", token.simple(), sanitize_filename(original_filename))
}

/// Root-relative URL for a file stored in the uploads directory.
pub fn public_url(filename: &str) -> String {
    format!("{PUBLIC_UPLOADS_PREFIX}/{filename}")
}

// ---------------------------------------------------------------------------
// Artifact store
// ---------------------------------------------------------------------------

/// Persists generated images into the public uploads directory.
#[derive(Clone)]
pub struct ArtifactStore {
    uploads_dir: PathBuf,
    clock: Arc<dyn Clock>,
}

impl ArtifactStore {
    pub fn new(uploads_dir: impl Into<PathBuf>) -> Self {
        Self::with_clock(uploads_dir, Arc::new(SystemClock))
    }

    pub fn with_clock(uploads_dir: impl Into<PathBuf>, clock: Arc<dyn Clock>) -> Self {
        Self {
            uploads_dir: uploads_dir.into(),
            clock,
        }
    }

    /// Copy `source` into the uploads directory and return its public URL.
    ///
    /// The source file is left in place. The target name is
    /// `{epoch_millis}-{sanitized basename of original_filename}`.
    pub async fn store(&self, source: &Path, original_filename: &str) -> Result<String, StorageError> {
        let filename = timestamped_filename(self.clock.epoch_millis(), original_filename);
        let target = self.uploads_dir.join(&filename);

        tokio::fs::copy(source, &target)
            .await
            .map_err(|source| StorageError::Copy {
                path: target.clone(),
                source,
            })?;

        tracing::info!(target = %target.display(), "Stored generation artifact");
        Ok(public_url(&filename))
    }

    /// Delete a previously stored artifact by its public URL.
    ///
    /// URLs outside [`PUBLIC_UPLOADS_PREFIX`] are ignored. Failures are
    /// logged, not returned.
    pub async fn remove(&self, url: &str) {
        let Some(filename) = url
            .strip_prefix(PUBLIC_UPLOADS_PREFIX)
            .and_then(|rest| rest.strip_prefix('/'))
        else {
            return;
        };
        let target = self.uploads_dir.join(sanitize_filename(filename));
        if let Err(e) = tokio::fs::remove_file(&target).await {
            tracing::warn!(target = %target.display(), error = %e, "Failed to remove artifact");
        }
    }
}

// ---------------------------------------------------------------------------
// Upload staging
// ---------------------------------------------------------------------------

/// Writes raw uploads into a private staging directory.
#[derive(Clone)]
pub struct UploadStaging {
    staging_dir: PathBuf,
    clock: Arc<dyn Clock>,
}

/// An upload written to the staging directory.
///
/// The file is removed when the value is dropped, including when the
/// request that owns it is abandoned mid-flight.
#[derive(Debug)]
pub struct StagedUpload {
    pub path: PathBuf,
    pub filename: String,
}

impl UploadStaging {
    pub fn new(staging_dir: impl Into<PathBuf>) -> Self {
        Self::with_clock(staging_dir, Arc::new(SystemClock))
    }

    pub fn with_clock(staging_dir: impl Into<PathBuf>, clock: Arc<dyn Clock>) -> Self {
        Self {
            staging_dir: staging_dir.into(),
            clock,
        }
    }

    /// Write `bytes` as `{epoch_millis}-{token}-{sanitized original_filename}`.
    ///
    /// The file is created exclusively; an existing path is never overwritten.
    pub async fn stage(&self, original_filename: &str, bytes: &[u8]) -> Result<StagedUpload, StorageError> {
        let filename = staged_filename(self.clock.epoch_millis(), Uuid::new_v4(), original_filename);
        let path = self.staging_dir.join(&filename);

        let stage_err = |source| StorageError::Stage {
            path: path.clone(),
            source,
        };
        let mut file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
            .map_err(stage_err)?;
        // From here on the guard owns the file and removes it on any early return.
        let staged = StagedUpload { path: path.clone(), filename };
        file.write_all(bytes).await.map_err(stage_err)?;
        file.flush().await.map_err(stage_err)?;

        Ok(staged)
    }
}

impl Drop for StagedUpload {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Failed to remove staged upload");
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
