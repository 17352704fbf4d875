//! [`ObjectClient`] backed by the `rust-s3` crate.

use std::time::Duration;

use async_trait::async_trait;
use s3::bucket::Bucket;
use s3::bucket_ops::BucketConfiguration;
use s3::creds::Credentials;
use s3::error::S3Error;
use s3::region::Region;
use skydisk_core::{DiskError, DiskResult};
use tracing::debug;

use super::client::{ObjectClient, ObjectStoreError};
use super::config::ObjectStoreConfig;

/// Path-style S3 client bound to one bucket.
pub struct S3Client {
    bucket: Box<Bucket>,
    region: Region,
    credentials: Credentials,
}

impl S3Client {
    /// Build a client from a source config. No network I/O happens here.
    ///
    /// # Errors
    ///
    /// Returns [`DiskError::Config`] if the credentials or bucket handle
    /// cannot be constructed.
    pub fn connect(config: &ObjectStoreConfig) -> DiskResult<Self> {
        let region = Region::Custom {
            region: config.region().to_owned(),
            endpoint: config.endpoint.trim_end_matches('/').to_owned(),
        };
        let credentials = Credentials::new(
            Some(&config.access_key),
            Some(&config.secret_key),
            None,
            None,
            None,
        )
        .map_err(|e| DiskError::Config(format!("invalid object-store credentials: {e}")))?;
        let bucket = Bucket::new(&config.bucket, region.clone(), credentials.clone())
            .map_err(|e| DiskError::Config(format!("invalid bucket '{}': {e}", config.bucket)))?
            .with_path_style();
        debug!(endpoint = %config.endpoint, bucket = %config.bucket, "built object-store client");
        Ok(Self {
            bucket,
            region,
            credentials,
        })
    }
}

impl std::fmt::Debug for S3Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3Client")
            .field("bucket", &self.bucket.name)
            .field("region", &self.region)
            .finish_non_exhaustive()
    }
}

fn map_err(err: S3Error) -> ObjectStoreError {
    match err {
        S3Error::HttpFailWithBody(code, message) => ObjectStoreError::Status { code, message },
        other => ObjectStoreError::Transport(other.to_string()),
    }
}

fn check_status(code: u16, body: &[u8]) -> Result<(), ObjectStoreError> {
    if (200..300).contains(&code) {
        Ok(())
    } else {
        Err(ObjectStoreError::Status {
            code,
            message: String::from_utf8_lossy(body).into_owned(),
        })
    }
}

#[async_trait]
impl ObjectClient for S3Client {
    async fn bucket_exists(&self) -> Result<bool, ObjectStoreError> {
        match self.bucket.exists().await {
            Ok(found) => Ok(found),
            Err(S3Error::HttpFailWithBody(404, _)) => Ok(false),
            Err(e) => Err(map_err(e)),
        }
    }

    async fn create_bucket(&self) -> Result<(), ObjectStoreError> {
        let response = Bucket::create_with_path_style(
            &self.bucket.name,
            self.region.clone(),
            self.credentials.clone(),
            BucketConfiguration::default(),
        )
        .await
        .map_err(map_err)?;
        if response.success() {
            Ok(())
        } else {
            Err(ObjectStoreError::Status {
                code: response.response_code,
                message: response.response_text,
            })
        }
    }

    async fn put_object(
        &self,
        key: &str,
        content_type: &str,
        body: Vec<u8>,
    ) -> Result<(), ObjectStoreError> {
        let response = self
            .bucket
            .put_object_with_content_type(key, &body, content_type)
            .await
            .map_err(map_err)?;
        check_status(response.status_code(), response.as_slice())
    }

    async fn get_object(&self, key: &str) -> Result<Vec<u8>, ObjectStoreError> {
        let response = self.bucket.get_object(key).await.map_err(map_err)?;
        check_status(response.status_code(), response.as_slice())?;
        Ok(response.to_vec())
    }

    async fn delete_object(&self, key: &str) -> Result<(), ObjectStoreError> {
        let response = self.bucket.delete_object(key).await.map_err(map_err)?;
        check_status(response.status_code(), response.as_slice())
    }

    async fn presign_get(&self, key: &str, ttl: Duration) -> Result<String, ObjectStoreError> {
        let secs = u32::try_from(ttl.as_secs()).unwrap_or(u32::MAX);
        self.bucket
            .presign_get(key, secs, None)
            .await
            .map_err(map_err)
    }
}
