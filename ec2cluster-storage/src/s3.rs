//! AWS SDK S3 object store.

use std::path::Path;

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_credential_types::Credentials;
use aws_sdk_s3::Client as S3Client;
use aws_sdk_s3::config::Region;
use aws_sdk_s3::error::ProvideErrorMetadata;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{BucketLocationConstraint, CreateBucketConfiguration};
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use crate::error::{Result, StorageError};
use crate::traits::{BucketStatus, ObjectStore};

/// Region S3 treats as the default location; buckets there take no location constraint.
const DEFAULT_REGION: &str = "us-east-1";

/// Static access keys for S3.
#[derive(Clone)]
pub struct S3Credentials {
    pub access_key_id: String,
    pub secret_access_key: String,
}

impl std::fmt::Debug for S3Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .finish()
    }
}

/// Connection settings for `S3ObjectStore`.
#[derive(Debug, Clone)]
pub struct S3Settings {
    pub region: String,
    /// Custom endpoint for S3-compatible stores; enables path-style addressing.
    pub endpoint: Option<String>,
    /// Falls back to the default AWS credential chain when unset.
    pub credentials: Option<S3Credentials>,
}

impl Default for S3Settings {
    fn default() -> Self {
        Self {
            region: DEFAULT_REGION.to_string(),
            endpoint: None,
            credentials: None,
        }
    }
}

/// `ObjectStore` backed by the AWS SDK for Rust.
pub struct S3ObjectStore {
    s3_client: S3Client,
    region: String,
}

impl S3ObjectStore {
    /// Create a store from settings.
    ///
    /// # Arguments
    /// * `settings` - Region, optional endpoint and optional static credentials
    pub async fn new(settings: S3Settings) -> Self {
        let config_loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(settings.region.clone()));

        let config_loader = if let Some(ref creds) = settings.credentials {
            let credentials = Credentials::new(
                &creds.access_key_id,
                &creds.secret_access_key,
                None,
                None,
                "ec2cluster-config",
            );
            config_loader.credentials_provider(credentials)
        } else {
            config_loader
        };

        let sdk_config = config_loader.load().await;

        let mut s3_config = aws_sdk_s3::config::Builder::from(&sdk_config);
        if let Some(ref endpoint) = settings.endpoint {
            s3_config = s3_config.endpoint_url(endpoint).force_path_style(true);
        }

        Self {
            s3_client: S3Client::from_conf(s3_config.build()),
            region: settings.region,
        }
    }
}

/// Location constraint for bucket creation outside the default region.
fn bucket_configuration(region: &str) -> Option<CreateBucketConfiguration> {
    if region == DEFAULT_REGION {
        return None;
    }

    Some(
        CreateBucketConfiguration::builder()
            .location_constraint(BucketLocationConstraint::from(region))
            .build(),
    )
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn ensure_bucket(&self, bucket: &str) -> Result<BucketStatus> {
        // us-east-1 answers CreateBucket on an owned bucket with 200, so look first.
        match self.s3_client.head_bucket().bucket(bucket).send().await {
            Ok(_) => {
                debug!("Bucket {} is already owned by this account", bucket);
                return Ok(BucketStatus::AlreadyPresent);
            }
            Err(err) => {
                let service_err = err.into_service_error();
                if !service_err.is_not_found() {
                    debug!("HeadBucket {} failed, trying create: {}", bucket, service_err);
                }
            }
        }

        let request = self
            .s3_client
            .create_bucket()
            .bucket(bucket)
            .set_create_bucket_configuration(bucket_configuration(&self.region));

        match request.send().await {
            Ok(_) => {
                info!("Created bucket {}", bucket);
                Ok(BucketStatus::Created)
            }
            Err(err) => {
                let service_err = err.into_service_error();
                if service_err.is_bucket_already_owned_by_you() {
                    debug!("Bucket {} is already owned by this account", bucket);
                    Ok(BucketStatus::AlreadyPresent)
                } else if service_err.is_bucket_already_exists() {
                    warn!(
                        "{} bucket already exists and may belong to another account",
                        bucket
                    );
                    Ok(BucketStatus::AlreadyPresent)
                } else {
                    Err(StorageError::service(service_err))
                }
            }
        }
    }

    async fn upload(&self, bucket: &str, key: &str, local_path: &Path) -> Result<u64> {
        let size = tokio::fs::metadata(local_path)
            .await
            .map_err(|e| StorageError::io(local_path.display(), e))?
            .len();

        let body = ByteStream::from_path(local_path)
            .await
            .map_err(|e| StorageError::io(local_path.display(), e))?;

        self.s3_client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(body)
            .send()
            .await
            .map_err(|err| {
                let service_err = err.into_service_error();
                if service_err.code() == Some("NoSuchBucket") {
                    StorageError::NoSuchBucket {
                        bucket: bucket.to_string(),
                    }
                } else {
                    StorageError::service(service_err)
                }
            })?;

        debug!("Uploaded {} bytes to {}/{}", size, bucket, key);
        Ok(size)
    }

    async fn download(&self, bucket: &str, key: &str, local_path: &Path) -> Result<u64> {
        let response = self
            .s3_client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|err| {
                let service_err = err.into_service_error();
                if service_err.is_no_such_key() {
                    StorageError::NotFound {
                        bucket: bucket.to_string(),
                        key: key.to_string(),
                    }
                } else if service_err.code() == Some("NoSuchBucket") {
                    StorageError::NoSuchBucket {
                        bucket: bucket.to_string(),
                    }
                } else {
                    StorageError::service(service_err)
                }
            })?;

        // Create parent directories if needed
        if let Some(parent) = local_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StorageError::io(parent.display(), e))?;
        }

        let mut file = File::create(local_path)
            .await
            .map_err(|e| StorageError::io(local_path.display(), e))?;

        let mut written: u64 = 0;
        let mut body = response.body;
        while let Some(chunk) = body.try_next().await.map_err(StorageError::service)? {
            file.write_all(&chunk)
                .await
                .map_err(|e| StorageError::io(local_path.display(), e))?;
            written += chunk.len() as u64;
        }

        file.flush()
            .await
            .map_err(|e| StorageError::io(local_path.display(), e))?;

        debug!("Downloaded {} bytes from {}/{}", written, bucket, key);
        Ok(written)
    }
}
