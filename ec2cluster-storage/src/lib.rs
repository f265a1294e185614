//! Object storage for job inputs and outputs.
//!
//! The driver only needs three things from a store: make sure a bucket
//! exists, put a local file under a key, and stream a key back into a local
//! file. `ObjectStore` captures that; `S3ObjectStore` talks to S3 (or any
//! S3-compatible endpoint) through the AWS SDK, and `MemoryObjectStore`
//! keeps everything in process.

mod error;
mod memory;
mod s3;
mod traits;

pub use error::{Result, StorageError};
pub use memory::MemoryObjectStore;
pub use s3::{S3Credentials, S3ObjectStore, S3Settings};
pub use traits::{BucketStatus, ObjectStore};
