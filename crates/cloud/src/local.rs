//! Filesystem-backed object store.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use cad3d_core::storage::{self, ObjectStore, StoreError};
use tokio::io::AsyncWriteExt;

/// Stores each bucket as a directory under `root`.
#[derive(Debug, Clone)]
pub struct LocalObjectStore {
    bucket_dir: PathBuf,
    bucket: String,
    public_base_url: String,
}

impl LocalObjectStore {
    pub fn new(root: &Path, bucket: &str, public_base_url: &str) -> Self {
        Self {
            bucket_dir: root.join(bucket),
            bucket: bucket.to_string(),
            public_base_url: public_base_url.to_string(),
        }
    }

    /// Resolve `key` inside the bucket directory, refusing keys that would
    /// escape it.
    fn object_path(&self, key: &str) -> Result<PathBuf, StoreError> {
        let relative = Path::new(key);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)));
        if key.is_empty() || escapes {
            return Err(StoreError::Rejected(format!("invalid object key '{key}'")));
        }
        Ok(self.bucket_dir.join(relative))
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn upload(
        &self,
        key: &str,
        bytes: Vec<u8>,
        _content_type: &str,
    ) -> Result<(), StoreError> {
        let path = self.object_path(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let file = match tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
        {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                return Err(StoreError::Duplicate {
                    bucket: self.bucket.clone(),
                    key: key.to_string(),
                });
            }
            Err(e) => return Err(e.into()),
        };

        write_or_discard(file, &path, &bytes).await
    }

    fn public_url(&self, key: &str) -> String {
        storage::public_url(&self.public_base_url, &self.bucket, key)
    }
}

/// Write `bytes` to a freshly created object file. On failure the partial
/// file is removed so the key stays free for a retry.
async fn write_or_discard(
    mut file: tokio::fs::File,
    path: &Path,
    bytes: &[u8],
) -> Result<(), StoreError> {
    let written = async {
        file.write_all(bytes).await?;
        file.flush().await
    }
    .await;

    if let Err(e) = written {
        drop(file);
        if let Err(remove_err) = tokio::fs::remove_file(path).await {
            tracing::warn!(
                path = %path.display(),
                error = %remove_err,
                "Failed to remove partial object",
            );
        }
        return Err(e.into());
    }
    Ok(())
}
