//! Object-store source configuration.

use std::fmt;
use std::hash::{DefaultHasher, Hash, Hasher};

use serde::{Deserialize, Serialize};
use skydisk_core::path::normalize_directory;
use skydisk_core::{DiskError, DiskResult, StorageSource};

/// Region used when a source does not name one.
pub const DEFAULT_REGION: &str = "us-east-1";

/// Parsed config payload of an object-store source.
///
/// The payload is JSON with camelCase keys: `endpoint`, `bucket`,
/// `accessKey`, `secretKey`, and optionally `region` and `basePath`.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectStoreConfig {
    /// Service endpoint URL.
    pub endpoint: String,
    /// Bucket holding every object of the source.
    pub bucket: String,
    /// Access key id.
    pub access_key: String,
    /// Secret access key.
    pub secret_key: String,
    /// Signing region.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    /// Key prefix all objects live under.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_path: Option<String>,
}

impl ObjectStoreConfig {
    /// Parse and validate the config payload of `source`.
    ///
    /// # Errors
    ///
    /// Returns [`DiskError::Config`] when the payload is not valid JSON, a
    /// required field is missing or blank, or the base path is malformed.
    pub fn from_source(source: &StorageSource) -> DiskResult<Self> {
        let config: Self = serde_json::from_str(&source.config).map_err(|e| {
            DiskError::Config(format!(
                "object-store source '{}' has an invalid config: {e}",
                source.name
            ))
        })?;
        config.validate().map_err(|field| {
            DiskError::Config(format!(
                "object-store source '{}' is missing '{field}'",
                source.name
            ))
        })?;
        config.prefix().map_err(|e| {
            DiskError::Config(format!(
                "object-store source '{}' has an invalid basePath: {e}",
                source.name
            ))
        })?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), &'static str> {
        let required = [
            ("endpoint", &self.endpoint),
            ("bucket", &self.bucket),
            ("accessKey", &self.access_key),
            ("secretKey", &self.secret_key),
        ];
        match required.iter().find(|(_, value)| value.trim().is_empty()) {
            Some((field, _)) => Err(*field),
            None => Ok(()),
        }
    }

    /// The configured region, or [`DEFAULT_REGION`].
    #[must_use]
    pub fn region(&self) -> &str {
        self.region
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .unwrap_or(DEFAULT_REGION)
    }

    /// The canonical key prefix, `""` when objects live at the bucket root.
    ///
    /// # Errors
    ///
    /// Returns [`DiskError::InvalidPath`] when `basePath` is malformed.
    pub fn prefix(&self) -> DiskResult<String> {
        normalize_directory(self.base_path.as_deref().unwrap_or_default())
    }

    /// Serialize back into a source config payload.
    ///
    /// # Errors
    ///
    /// Returns [`DiskError::Config`] if serialization fails.
    pub fn to_payload(&self) -> DiskResult<String> {
        serde_json::to_string(self).map_err(|e| DiskError::Config(e.to_string()))
    }

    /// Stable hash of the settings a client is built from.
    #[must_use]
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.hash(&mut hasher);
        hasher.finish()
    }
}

impl fmt::Debug for ObjectStoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectStoreConfig")
            .field("endpoint", &self.endpoint)
            .field("bucket", &self.bucket)
            .field("access_key", &self.access_key)
            .field("secret_key", &"[REDACTED]")
            .field("region", &self.region())
            .field("base_path", &self.base_path)
            .finish()
    }
}
