//! Upload staged artifacts to durable storage.

use std::path::Path;
use std::sync::Arc;

use cad3d_core::artifact::{PublishedArtifact, StagedArtifact};
use cad3d_core::job::{ArtifactKind, Job};
use cad3d_core::storage::ObjectStore;

use crate::error::PipelineError;

/// Publishes inputs and outputs to their respective buckets. Uploads are
/// attempted once.
#[derive(Clone)]
pub struct Publisher {
    inputs: Arc<dyn ObjectStore>,
    outputs: Arc<dyn ObjectStore>,
}

impl Publisher {
    pub fn new(inputs: Arc<dyn ObjectStore>, outputs: Arc<dyn ObjectStore>) -> Self {
        Self { inputs, outputs }
    }

    /// Upload the staged drawing.
    pub async fn publish_input(
        &self,
        job: &Job,
        artifact: &StagedArtifact,
    ) -> Result<PublishedArtifact, PipelineError> {
        let bytes = tokio::fs::read(&artifact.path).await.map_err(|e| PipelineError::Publish {
            bucket: self.inputs.bucket().to_string(),
            reason: format!("cannot read staged input: {e}"),
        })?;
        upload(self.inputs.as_ref(), job, ArtifactKind::InputImage, bytes).await
    }

    /// Read the engine's output from `output_path` and upload it.
    ///
    /// An absent or empty output file is [`PipelineError::ArtifactMissing`],
    /// even though the engine reported success.
    pub async fn publish_output(
        &self,
        job: &Job,
        output_path: &Path,
    ) -> Result<PublishedArtifact, PipelineError> {
        let bytes = match tokio::fs::read(output_path).await {
            Ok(bytes) if !bytes.is_empty() => bytes,
            Ok(_) => {
                return Err(PipelineError::ArtifactMissing {
                    path: output_path.to_path_buf(),
                });
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(PipelineError::ArtifactMissing {
                    path: output_path.to_path_buf(),
                });
            }
            Err(e) => {
                return Err(PipelineError::Publish {
                    bucket: self.outputs.bucket().to_string(),
                    reason: format!("cannot read engine output: {e}"),
                });
            }
        };
        upload(self.outputs.as_ref(), job, ArtifactKind::OutputModel, bytes).await
    }
}

async fn upload(
    store: &dyn ObjectStore,
    job: &Job,
    kind: ArtifactKind,
    bytes: Vec<u8>,
) -> Result<PublishedArtifact, PipelineError> {
    let key = job.storage_key(kind);
    let byte_len = bytes.len();

    store
        .upload(&key, bytes, job.content_type(kind))
        .await
        .map_err(|e| PipelineError::Publish {
            bucket: store.bucket().to_string(),
            reason: e.to_string(),
        })?;

    let url = store.public_url(&key);
    tracing::info!(bucket = store.bucket(), key = %key, bytes = byte_len, "Artifact published");
    Ok(PublishedArtifact { key, url, kind })
}
