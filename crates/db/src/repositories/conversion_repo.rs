//! Repository for the `conversions` table.

use cad3d_core::types::DbId;
use sqlx::PgPool;

use crate::models::conversion::{Conversion, CreateConversion};

/// Column list for `conversions` queries.
const COLUMNS: &str = "id, job_id, prompt, file_name, image_url, step_url, created_at";

/// Provides query operations for conversion records.
pub struct ConversionRepo;

impl ConversionRepo {
    /// Insert a conversion record. Fails with a unique violation
    /// (`uq_conversions_job_id`) if the job was already recorded.
    pub async fn create(
        pool: &PgPool,
        input: &CreateConversion,
    ) -> Result<Conversion, sqlx::Error> {
        let query = format!(
            "INSERT INTO conversions (job_id, prompt, file_name, image_url, step_url) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Conversion>(&query)
            .bind(input.job_id)
            .bind(&input.prompt)
            .bind(&input.file_name)
            .bind(&input.image_url)
            .bind(&input.step_url)
            .fetch_one(pool)
            .await
    }

    /// Find a conversion by its record id.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Conversion>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM conversions WHERE id = $1");
        sqlx::query_as::<_, Conversion>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }
}
