//! Materialize the uploaded drawing as an engine-readable local file.

use std::path::PathBuf;

use base64::Engine as _;
use cad3d_core::artifact::StagedArtifact;
use cad3d_core::job::{ArtifactKind, Job};

use crate::cleanup::StagingWorkspace;
use crate::error::PipelineError;

/// Creates per-job staging namespaces under a shared root.
///
/// Each job gets `<root>/<job-id>/`, created with `create_dir` so two jobs
/// can never share one. The input is written as `input.<ext>`; the output
/// path `output.step` is reserved but left for the engine to create.
#[derive(Debug, Clone)]
pub struct Stager {
    root: PathBuf,
}

impl Stager {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Decode `image_data` (base64, no data-URI prefix) and stage it.
    pub async fn stage(&self, job: &Job, image_data: &str) -> Result<StagingWorkspace, PipelineError> {
        let bytes = decode_image(image_data)?;

        tokio::fs::create_dir_all(&self.root).await.map_err(|e| {
            PipelineError::Staging(format!(
                "cannot create staging root {}: {e}",
                self.root.display()
            ))
        })?;

        let dir = self.root.join(job.id.to_string());
        tokio::fs::create_dir(&dir).await.map_err(|e| {
            PipelineError::Staging(format!(
                "cannot create staging directory {}: {e}",
                dir.display()
            ))
        })?;

        let input = StagedArtifact {
            path: dir.join(format!("input.{}", job.extension(ArtifactKind::InputImage))),
            byte_len: bytes.len() as u64,
            kind: ArtifactKind::InputImage,
        };
        let output_path = dir.join(format!("output.{}", job.extension(ArtifactKind::OutputModel)));
        let workspace = StagingWorkspace::new(dir, input, output_path);

        if let Err(e) = tokio::fs::write(&workspace.input().path, &bytes).await {
            let reason = format!(
                "cannot write staged input {}: {e}",
                workspace.input().path.display()
            );
            if let Err(cleanup) = workspace.release().await {
                tracing::error!(error = %cleanup, "Failed to remove partial staging directory");
            }
            return Err(PipelineError::Staging(reason));
        }

        tracing::debug!(
            path = %workspace.input().path.display(),
            bytes = workspace.input().byte_len,
            "Input staged",
        );
        Ok(workspace)
    }
}

/// Base64-decode and sniff the drawing. Only PNG and JPEG are accepted.
fn decode_image(image_data: &str) -> Result<Vec<u8>, PipelineError> {
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(image_data.trim())
        .map_err(|e| PipelineError::Staging(format!("image data is not valid base64: {e}")))?;

    if bytes.is_empty() {
        return Err(PipelineError::Staging("image data is empty".to_string()));
    }

    match image::guess_format(&bytes) {
        Ok(image::ImageFormat::Png | image::ImageFormat::Jpeg) => Ok(bytes),
        Ok(other) => Err(PipelineError::Staging(format!(
            "unsupported image format {other:?}; expected PNG or JPEG"
        ))),
        Err(_) => Err(PipelineError::Staging(
            "image data is not a recognizable PNG or JPEG".to_string(),
        )),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
