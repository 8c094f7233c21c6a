//! Object storage backends for published artifacts.
//!
//! - [`s3::S3ObjectStore`]: any S3-compatible service (AWS, MinIO, Supabase
//!   storage) through `aws-sdk-s3`.
//! - [`local::LocalObjectStore`]: a directory tree, for development and the
//!   CLI.
//! - [`memory::MemoryObjectStore`]: in-process, for tests.

pub mod local;
pub mod memory;
pub mod s3;

use std::path::PathBuf;
use std::sync::Arc;

use cad3d_core::storage::{ObjectStore, StorageBackendType};

/// Settings shared by both buckets of a deployment.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub backend: StorageBackendType,
    pub input_bucket: String,
    pub output_bucket: String,
    /// Base of public locators (`<base>/<bucket>/<key>`).
    pub public_base_url: String,
    /// Root directory for the local backend.
    pub local_root: PathBuf,
    /// Endpoint override for S3-compatible services.
    pub s3_endpoint: Option<String>,
}

/// The input and output buckets, ready for the publisher.
#[derive(Clone)]
pub struct Buckets {
    pub inputs: Arc<dyn ObjectStore>,
    pub outputs: Arc<dyn ObjectStore>,
}

/// Build both buckets for the configured backend.
pub async fn build_buckets(config: &StorageConfig) -> Buckets {
    match config.backend {
        StorageBackendType::Local => Buckets {
            inputs: Arc::new(local::LocalObjectStore::new(
                &config.local_root,
                &config.input_bucket,
                &config.public_base_url,
            )),
            outputs: Arc::new(local::LocalObjectStore::new(
                &config.local_root,
                &config.output_bucket,
                &config.public_base_url,
            )),
        },
        StorageBackendType::S3 => {
            let client = s3::build_client(config.s3_endpoint.as_deref()).await;
            Buckets {
                inputs: Arc::new(s3::S3ObjectStore::new(
                    client.clone(),
                    &config.input_bucket,
                    &config.public_base_url,
                )),
                outputs: Arc::new(s3::S3ObjectStore::new(
                    client,
                    &config.output_bucket,
                    &config.public_base_url,
                )),
            }
        }
    }
}
