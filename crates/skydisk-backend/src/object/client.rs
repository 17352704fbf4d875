//! The native object-store client seam.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use skydisk_core::DiskResult;

use super::config::ObjectStoreConfig;

/// Errors from an [`ObjectClient`].
#[derive(Debug, thiserror::Error)]
pub enum ObjectStoreError {
    /// The service answered with a non-success status.
    #[error("object store returned HTTP {code}: {message}")]
    Status {
        /// HTTP status code.
        code: u16,
        /// Response body or reason.
        message: String,
    },

    /// The request never produced a response.
    #[error("object store request failed: {0}")]
    Transport(String),
}

impl ObjectStoreError {
    /// The HTTP status, if the service answered.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { code, .. } => Some(*code),
            Self::Transport(_) => None,
        }
    }

    /// Whether the object or bucket does not exist.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

/// A client bound to one bucket of an S3-compatible service.
#[async_trait]
pub trait ObjectClient: Send + Sync {
    /// Whether the bound bucket exists.
    async fn bucket_exists(&self) -> Result<bool, ObjectStoreError>;

    /// Create the bound bucket.
    async fn create_bucket(&self) -> Result<(), ObjectStoreError>;

    /// Write an object.
    async fn put_object(
        &self,
        key: &str,
        content_type: &str,
        body: Vec<u8>,
    ) -> Result<(), ObjectStoreError>;

    /// Read an object.
    async fn get_object(&self, key: &str) -> Result<Vec<u8>, ObjectStoreError>;

    /// Remove an object.
    async fn delete_object(&self, key: &str) -> Result<(), ObjectStoreError>;

    /// Mint a presigned GET URL valid for `ttl`.
    async fn presign_get(&self, key: &str, ttl: Duration) -> Result<String, ObjectStoreError>;
}

/// Builds an [`ObjectClient`] from a parsed source config.
pub type ClientFactory =
    Arc<dyn Fn(&ObjectStoreConfig) -> DiskResult<Arc<dyn ObjectClient>> + Send + Sync>;
