//! In-process object store.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use cad3d_core::storage::{self, ObjectStore, StoreError};

/// A stored object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

/// Keeps objects in a map. Can be switched to reject every upload.
#[derive(Debug, Default)]
pub struct MemoryObjectStore {
    bucket: String,
    public_base_url: String,
    objects: Mutex<HashMap<String, StoredObject>>,
    rejection: Mutex<Option<String>>,
}

impl MemoryObjectStore {
    pub fn new(bucket: &str, public_base_url: &str) -> Self {
        Self {
            bucket: bucket.to_string(),
            public_base_url: public_base_url.to_string(),
            ..Self::default()
        }
    }

    /// Make every subsequent upload fail with `reason`.
    pub fn reject_uploads(&self, reason: &str) {
        *self.rejection.lock().unwrap_or_else(|e| e.into_inner()) = Some(reason.to_string());
    }

    pub fn get(&self, key: &str) -> Option<StoredObject> {
        self.objects
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(key)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.objects.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn upload(&self, key: &str, bytes: Vec<u8>, content_type: &str)
        -> Result<(), StoreError> {
        if let Some(reason) = self.rejection.lock().unwrap_or_else(|e| e.into_inner()).clone() {
            return Err(StoreError::Rejected(reason));
        }

        let mut objects = self.objects.lock().unwrap_or_else(|e| e.into_inner());
        if objects.contains_key(key) {
            return Err(StoreError::Duplicate {
                bucket: self.bucket.clone(),
                key: key.to_string(),
            });
        }
        objects.insert(
            key.to_string(),
            StoredObject {
                bytes,
                content_type: content_type.to_string(),
            },
        );
        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        storage::public_url(&self.public_base_url, &self.bucket, key)
    }
}
