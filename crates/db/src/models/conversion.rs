//! Conversion record models.

use cad3d_core::metadata::NewJobRecord;
use cad3d_core::types::{DbId, JobId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `conversions` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Conversion {
    pub id: DbId,
    pub job_id: JobId,
    pub prompt: String,
    pub file_name: String,
    pub image_url: String,
    pub step_url: String,
    pub created_at: Timestamp,
}

/// DTO for inserting a conversion record.
#[derive(Debug, Clone)]
pub struct CreateConversion {
    pub job_id: JobId,
    pub prompt: String,
    pub file_name: String,
    pub image_url: String,
    pub step_url: String,
}

impl From<&NewJobRecord> for CreateConversion {
    fn from(record: &NewJobRecord) -> Self {
        Self {
            job_id: record.job_id,
            prompt: record.prompt.clone(),
            file_name: record.file_name.clone(),
            image_url: record.image_url.clone(),
            step_url: record.step_url.clone(),
        }
    }
}
