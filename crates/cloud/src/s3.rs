//! S3-compatible object store.

use async_trait::async_trait;
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata};
use aws_sdk_s3::primitives::ByteStream;
use cad3d_core::storage::{self, ObjectStore, StoreError};

/// HTTP statuses S3-compatible services use to refuse an existing key
/// under `If-None-Match: *`.
const DUPLICATE_STATUSES: [u16; 2] = [409, 412];

/// Build an S3 client from the standard AWS environment.
///
/// With `endpoint` set, requests go to that endpoint using path-style
/// addressing (MinIO, Supabase storage and similar).
pub async fn build_client(endpoint: Option<&str>) -> aws_sdk_s3::Client {
    let sdk_config = aws_config::load_from_env().await;
    let mut builder = aws_sdk_s3::config::Builder::from(&sdk_config);
    if let Some(endpoint) = endpoint {
        builder = builder.endpoint_url(endpoint).force_path_style(true);
    }
    aws_sdk_s3::Client::from_conf(builder.build())
}

/// One bucket on an S3-compatible service.
#[derive(Debug, Clone)]
pub struct S3ObjectStore {
    client: aws_sdk_s3::Client,
    bucket: String,
    public_base_url: String,
}

impl S3ObjectStore {
    pub fn new(client: aws_sdk_s3::Client, bucket: &str, public_base_url: &str) -> Self {
        Self {
            client,
            bucket: bucket.to_string(),
            public_base_url: public_base_url.to_string(),
        }
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn upload(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StoreError> {
        let result = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .if_none_match("*")
            .body(ByteStream::from(bytes))
            .send()
            .await;

        match result {
            Ok(_) => {
                tracing::debug!(bucket = %self.bucket, key, "Object uploaded");
                Ok(())
            }
            Err(err) => {
                let status = err.raw_response().map(|raw| raw.status().as_u16());
                if status.is_some_and(|s| DUPLICATE_STATUSES.contains(&s)) {
                    return Err(StoreError::Duplicate {
                        bucket: self.bucket.clone(),
                        key: key.to_string(),
                    });
                }

                let reason = err
                    .as_service_error()
                    .and_then(|service| service.message())
                    .map(str::to_string)
                    .unwrap_or_else(|| DisplayErrorContext(&err).to_string());
                Err(StoreError::Rejected(reason))
            }
        }
    }

    fn public_url(&self, key: &str) -> String {
        storage::public_url(&self.public_base_url, &self.bucket, key)
    }
}
