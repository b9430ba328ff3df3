//! Per-job scratch directory.

use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Scratch space scoped to one job: `<scratch>/<job_id>/`.
///
/// Holds `source.<ext>` and the `stems/` output directory. Must be released
/// with [`JobWorkspace::release`] on every exit path; release failures are
/// logged, never returned.
#[derive(Debug)]
pub struct JobWorkspace {
    root: PathBuf,
    source: PathBuf,
    stems: PathBuf,
}

impl JobWorkspace {
    /// Creates the job directory.
    pub async fn create(
        scratch_dir: &Path,
        job_id: &str,
        source_ext: Option<&str>,
    ) -> std::io::Result<Self> {
        let root = scratch_dir.join(job_id);
        tokio::fs::create_dir_all(&root).await?;

        let source = match source_ext {
            Some(ext) => root.join(format!("source.{}", ext)),
            None => root.join("source"),
        };
        let stems = root.join("stems");

        debug!(path = %root.display(), "Created job workspace");
        Ok(Self {
            root,
            source,
            stems,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Where the downloaded source is written.
    pub fn source_path(&self) -> &Path {
        &self.source
    }

    /// Output directory handed to the separator.
    pub fn stems_dir(&self) -> &Path {
        &self.stems
    }

    /// Removes the job directory and everything in it.
    pub async fn release(self) {
        match tokio::fs::remove_dir_all(&self.root).await {
            Ok(()) => debug!(path = %self.root.display(), "Released job workspace"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(
                path = %self.root.display(),
                error = %e,
                "Failed to remove job workspace"
            ),
        }
    }
}
