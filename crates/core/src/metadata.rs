//! Best-effort job record persistence.

use std::time::Duration;

use async_trait::async_trait;

use crate::types::JobId;

/// The single record written for a successful conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewJobRecord {
    pub job_id: JobId,
    pub prompt: String,
    pub file_name: String,
    pub image_url: String,
    pub step_url: String,
}

/// Failure to persist a job record. Never fatal to the job.
#[derive(Debug, thiserror::Error)]
pub enum MetadataError {
    #[error("metadata store unavailable: {0}")]
    Unavailable(String),

    #[error("metadata insert rejected: {0}")]
    Rejected(String),

    #[error("metadata insert timed out after {0:?}")]
    Timeout(Duration),
}

/// Persists job records. Returns the store-assigned identifier.
#[async_trait]
pub trait MetadataStore: Send + Sync {
    async fn record(&self, record: &NewJobRecord) -> Result<String, MetadataError>;
}
