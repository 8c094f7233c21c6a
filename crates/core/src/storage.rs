//! Durable object storage contract and backend selection.
//!
//! Two logical buckets back every deployment: one for uploaded drawings and
//! one for generated models. Each bucket supports upload-by-key (duplicate
//! keys are rejected) and public-locator resolution.

use async_trait::async_trait;

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Default bucket for uploaded drawings.
pub const DEFAULT_INPUT_BUCKET: &str = "drawings";

/// Default bucket for generated models.
pub const DEFAULT_OUTPUT_BUCKET: &str = "models";

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Why an object store refused or failed an upload.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("object already exists: {bucket}/{key}")]
    Duplicate { bucket: String, key: String },

    #[error("{0}")]
    Rejected(String),

    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// One logical bucket of durable storage.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Bucket name, used in log lines and locators.
    fn bucket(&self) -> &str;

    /// Upload `bytes` under `key`. Must fail with [`StoreError::Duplicate`]
    /// if the key already exists; uploads are never overwritten.
    async fn upload(&self, key: &str, bytes: Vec<u8>, content_type: &str)
        -> Result<(), StoreError>;

    /// Publicly resolvable locator for an uploaded key.
    fn public_url(&self, key: &str) -> String;
}

/// Join a public base URL, bucket and key into a locator.
pub fn public_url(base_url: &str, bucket: &str, key: &str) -> String {
    format!("{}/{bucket}/{}", base_url.trim_end_matches('/'), key.trim_start_matches('/'))
}

// ---------------------------------------------------------------------------
// Backend selection
// ---------------------------------------------------------------------------

/// Object storage backend type, selected by `STORAGE_BACKEND`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackendType {
    Local,
    S3,
}

impl StorageBackendType {
    /// Parse from its configuration name.
    pub fn from_name(name: &str) -> Result<Self, CoreError> {
        match name.trim().to_ascii_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "s3" => Ok(Self::S3),
            other => Err(CoreError::Validation(format!(
                "Unknown storage backend type '{other}'. Must be one of: local, s3"
            ))),
        }
    }

    /// Human-readable label.
    pub fn label(self) -> &'static str {
        match self {
            Self::Local => "Local Filesystem",
            Self::S3 => "Amazon S3 / Compatible",
        }
    }

    /// Configuration name value.
    pub fn name(self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::S3 => "s3",
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
