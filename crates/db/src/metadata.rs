//! [`MetadataStore`] backed by the `conversions` table.

use async_trait::async_trait;
use cad3d_core::metadata::{MetadataError, MetadataStore, NewJobRecord};

use crate::models::conversion::CreateConversion;
use crate::repositories::ConversionRepo;
use crate::DbPool;

/// Writes job records to PostgreSQL.
#[derive(Clone)]
pub struct PgMetadataStore {
    pool: DbPool,
}

impl PgMetadataStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MetadataStore for PgMetadataStore {
    async fn record(&self, record: &NewJobRecord) -> Result<String, MetadataError> {
        let row = ConversionRepo::create(&self.pool, &CreateConversion::from(record))
            .await
            .map_err(classify_sqlx_error)?;
        tracing::debug!(conversion_id = row.id, job_id = %row.job_id, "Conversion recorded");
        Ok(row.id.to_string())
    }
}

/// Connection-level failures are "unavailable"; everything else the
/// database answered with is "rejected".
fn classify_sqlx_error(err: sqlx::Error) -> MetadataError {
    match err {
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed => MetadataError::Unavailable(err.to_string()),
        other => MetadataError::Rejected(other.to_string()),
    }
}
