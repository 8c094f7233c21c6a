//! Best-effort persistence of the job record.

use std::sync::Arc;
use std::time::Duration;

use cad3d_core::artifact::PublishedArtifact;
use cad3d_core::job::Job;
use cad3d_core::metadata::{MetadataError, MetadataStore, NewJobRecord};

/// Default bound on one metadata insert.
pub const DEFAULT_METADATA_TIMEOUT: Duration = Duration::from_secs(10);

/// Result of the metadata stage. Either way the job carries on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetadataRecord {
    Recorded { id: String },
    NotRecorded { reason: String },
}

impl MetadataRecord {
    /// The store-assigned identifier, if the record was written.
    pub fn id(&self) -> Option<&str> {
        match self {
            Self::Recorded { id } => Some(id),
            Self::NotRecorded { .. } => None,
        }
    }
}

/// Writes one record per successful job, if a store is configured.
#[derive(Clone)]
pub struct Recorder {
    store: Option<Arc<dyn MetadataStore>>,
    timeout: Duration,
}

impl Recorder {
    pub fn new(store: Option<Arc<dyn MetadataStore>>, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    pub async fn record(
        &self,
        job: &Job,
        input: &PublishedArtifact,
        output: &PublishedArtifact,
    ) -> MetadataRecord {
        let Some(store) = &self.store else {
            tracing::debug!("No metadata store configured; skipping job record");
            return MetadataRecord::NotRecorded {
                reason: "metadata store disabled".to_string(),
            };
        };

        let record = NewJobRecord {
            job_id: job.id,
            prompt: job.prompt.clone(),
            file_name: job.file_name.clone(),
            image_url: input.url.clone(),
            step_url: output.url.clone(),
        };

        let error = match tokio::time::timeout(self.timeout, store.record(&record)).await {
            Ok(Ok(id)) => {
                tracing::info!(model_id = %id, "Job record written");
                return MetadataRecord::Recorded { id };
            }
            Ok(Err(e)) => e,
            Err(_elapsed) => MetadataError::Timeout(self.timeout),
        };

        tracing::warn!(error = %error, "Job record not written; job still succeeds");
        MetadataRecord::NotRecorded {
            reason: error.to_string(),
        }
    }
}
