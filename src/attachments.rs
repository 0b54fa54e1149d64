//! Temporary attachment staging and cleanup.

use crate::error::{PipelineError, PipelineResult};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Owns uploaded files for the duration of one firing.
///
/// Only files staged into the upload directory are ever deleted. Files a
/// template attaches on its own, and anything else outside the upload
/// directory, are left alone.
#[derive(Debug, Clone)]
pub struct AttachmentLifecycle {
    upload_dir: PathBuf,
}

impl AttachmentLifecycle {
    pub fn new(upload_dir: impl Into<PathBuf>) -> Self {
        Self {
            upload_dir: upload_dir.into(),
        }
    }

    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    /// Copy `source` into the upload directory under a unique name.
    ///
    /// The copy is what a job owns, so the caller's original is never deleted.
    pub async fn stage(&self, source: impl AsRef<Path>) -> PipelineResult<PathBuf> {
        let source = source.as_ref();
        let filename = source
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| {
                PipelineError::validation(format!("{} is not a file path", source.display()))
            })?;

        if !tokio::fs::metadata(source).await.is_ok_and(|m| m.is_file()) {
            return Err(PipelineError::validation(format!(
                "attachment not found: {}",
                source.display()
            )));
        }

        tokio::fs::create_dir_all(&self.upload_dir).await?;
        let staged = self
            .upload_dir
            .join(format!("{}_{}", uuid::Uuid::new_v4().simple(), filename));
        tokio::fs::copy(source, &staged).await?;

        debug!(source = %source.display(), staged = %staged.display(), "attachment staged");
        Ok(staged)
    }

    /// Whether `path` is a staged upload, i.e. a file directly inside the
    /// upload directory.
    pub fn owns(&self, path: &Path) -> bool {
        path.file_name().is_some() && path.parent() == Some(self.upload_dir.as_path())
    }

    /// Reject paths that were not staged by [`stage`](Self::stage).
    pub fn check_owned(&self, paths: &[PathBuf]) -> PipelineResult<()> {
        match paths.iter().find(|path| !self.owns(path)) {
            Some(path) => Err(PipelineError::validation(format!(
                "temporary attachment {} is not in the upload directory {}",
                path.display(),
                self.upload_dir.display()
            ))),
            None => Ok(()),
        }
    }

    /// Delete every staged path. Failures are logged and otherwise ignored.
    pub async fn release(&self, paths: &[PathBuf]) {
        for path in paths {
            if !self.owns(path) {
                warn!(
                    path = %path.display(),
                    upload_dir = %self.upload_dir.display(),
                    "not a staged upload, left in place"
                );
                continue;
            }
            match tokio::fs::remove_file(path).await {
                Ok(()) => info!(path = %path.display(), "temporary attachment removed"),
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    debug!(path = %path.display(), "temporary attachment already gone")
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "could not remove temporary attachment")
                }
            }
        }
    }
}
