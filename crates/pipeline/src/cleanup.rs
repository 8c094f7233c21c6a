//! Scoped ownership of a job's staged files.
//!
//! A [`StagingWorkspace`] owns one job's private staging directory. It is
//! released exactly once: explicitly through [`StagingWorkspace::release`]
//! on every normal exit path, or by `Drop` if the job task is cancelled or
//! panics first.

use std::path::{Path, PathBuf};

use cad3d_core::artifact::StagedArtifact;

/// A job's staging directory, its input file and its reserved output path.
#[derive(Debug)]
pub struct StagingWorkspace {
    dir: PathBuf,
    input: StagedArtifact,
    output_path: PathBuf,
    released: bool,
}

impl StagingWorkspace {
    /// Take ownership of an already-created directory.
    pub(crate) fn new(dir: PathBuf, input: StagedArtifact, output_path: PathBuf) -> Self {
        Self {
            dir,
            input,
            output_path,
            released: false,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn input(&self) -> &StagedArtifact {
        &self.input
    }

    /// Where the engine is expected to write its output. Not created here.
    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    /// Remove the staging directory and everything in it.
    ///
    /// Consuming `self` makes a second release impossible. A directory that
    /// is already gone counts as released.
    pub async fn release(mut self) -> std::io::Result<()> {
        self.released = true;
        match tokio::fs::remove_dir_all(&self.dir).await {
            Ok(()) => {
                tracing::debug!(dir = %self.dir.display(), "Staged artifacts removed");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }
}

impl Drop for StagingWorkspace {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        match std::fs::remove_dir_all(&self.dir) {
            Ok(()) => {
                tracing::warn!(dir = %self.dir.display(), "Staged artifacts removed on drop");
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::error!(
                    dir = %self.dir.display(),
                    error = %e,
                    "Failed to remove staged artifacts on drop",
                );
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
