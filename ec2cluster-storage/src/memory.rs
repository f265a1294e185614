//! In-process object store.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

use crate::error::{Result, StorageError};
use crate::traits::{BucketStatus, ObjectStore};

/// Downloads are written in pieces of this size to mirror a streamed body.
const CHUNK_SIZE: usize = 8 * 1024;

type Buckets = HashMap<String, HashMap<String, Vec<u8>>>;

/// `ObjectStore` that keeps buckets in memory.
#[derive(Debug, Default)]
pub struct MemoryObjectStore {
    buckets: Mutex<Buckets>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store bytes directly under `bucket/key`, creating the bucket if needed.
    pub fn insert_object(&self, bucket: &str, key: &str, data: impl Into<Vec<u8>>) {
        self.lock()
            .entry(bucket.to_string())
            .or_default()
            .insert(key.to_string(), data.into());
    }

    /// Bytes stored under `bucket/key`, if any.
    pub fn object(&self, bucket: &str, key: &str) -> Option<Vec<u8>> {
        self.lock().get(bucket).and_then(|b| b.get(key)).cloned()
    }

    /// Keys in a bucket, sorted.
    pub fn keys(&self, bucket: &str) -> Vec<String> {
        let mut keys: Vec<String> = self
            .lock()
            .get(bucket)
            .map(|b| b.keys().cloned().collect())
            .unwrap_or_default();
        keys.sort();
        keys
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Buckets> {
        self.buckets.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn ensure_bucket(&self, bucket: &str) -> Result<BucketStatus> {
        let mut buckets = self.lock();
        if buckets.contains_key(bucket) {
            return Ok(BucketStatus::AlreadyPresent);
        }
        buckets.insert(bucket.to_string(), HashMap::new());
        Ok(BucketStatus::Created)
    }

    async fn upload(&self, bucket: &str, key: &str, local_path: &Path) -> Result<u64> {
        let data = tokio::fs::read(local_path)
            .await
            .map_err(|e| StorageError::io(local_path.display(), e))?;
        let size = data.len() as u64;

        let mut buckets = self.lock();
        let objects = buckets
            .get_mut(bucket)
            .ok_or_else(|| StorageError::NoSuchBucket {
                bucket: bucket.to_string(),
            })?;
        objects.insert(key.to_string(), data);

        Ok(size)
    }

    async fn download(&self, bucket: &str, key: &str, local_path: &Path) -> Result<u64> {
        let data = {
            let buckets = self.lock();
            let objects = buckets.get(bucket).ok_or_else(|| StorageError::NoSuchBucket {
                bucket: bucket.to_string(),
            })?;
            objects
                .get(key)
                .cloned()
                .ok_or_else(|| StorageError::NotFound {
                    bucket: bucket.to_string(),
                    key: key.to_string(),
                })?
        };

        if let Some(parent) = local_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StorageError::io(parent.display(), e))?;
        }

        let mut file = File::create(local_path)
            .await
            .map_err(|e| StorageError::io(local_path.display(), e))?;

        for chunk in data.chunks(CHUNK_SIZE) {
            file.write_all(chunk)
                .await
                .map_err(|e| StorageError::io(local_path.display(), e))?;
        }

        file.flush()
            .await
            .map_err(|e| StorageError::io(local_path.display(), e))?;

        Ok(data.len() as u64)
    }
}
