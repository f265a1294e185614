//! Storage trait for the object store used by the driver.

use std::path::Path;

use async_trait::async_trait;

use crate::error::Result;

/// Outcome of `ObjectStore::ensure_bucket`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BucketStatus {
    /// The bucket was created by this call.
    Created,
    /// The bucket was already there; nothing changed.
    AlreadyPresent,
}

/// Bucket/key byte storage.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Create a bucket if it does not exist yet.
    ///
    /// An existing bucket is reported as `AlreadyPresent`, never as an error.
    async fn ensure_bucket(&self, bucket: &str) -> Result<BucketStatus>;

    /// Upload a local file to `bucket/key`. Returns the number of bytes sent.
    async fn upload(&self, bucket: &str, key: &str, local_path: &Path) -> Result<u64>;

    /// Stream `bucket/key` into a local file, creating or truncating it.
    /// Returns the number of bytes written.
    async fn download(&self, bucket: &str, key: &str, local_path: &Path) -> Result<u64>;
}
