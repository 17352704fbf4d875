//! Storage source definitions.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::ids::SourceId;

/// Kind of backend a storage source is served by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum StorageType {
    /// A directory on the host filesystem.
    Local,
    /// An S3-compatible bucket.
    ObjectStore,
}

impl fmt::Display for StorageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local => write!(f, "local"),
            Self::ObjectStore => write!(f, "object_store"),
        }
    }
}

impl FromStr for StorageType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "object_store" | "s3" => Ok(Self::ObjectStore),
            other => Err(format!("unknown storage type '{other}'")),
        }
    }
}

/// A named, configured instance of a storage backend.
///
/// `config` is an opaque payload interpreted by the backend that serves
/// `storage_type`: an absolute root path for [`StorageType::Local`], a JSON
/// document for [`StorageType::ObjectStore`].
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageSource {
    /// Stable identity.
    pub id: SourceId,
    /// Globally unique display name.
    pub name: String,
    /// Backend kind.
    #[serde(rename = "type")]
    pub storage_type: StorageType,
    /// Backend-specific configuration payload.
    pub config: String,
}

impl StorageSource {
    /// Create a source with a fresh id.
    #[must_use]
    pub fn new(name: impl Into<String>, storage_type: StorageType, config: impl Into<String>) -> Self {
        Self {
            id: SourceId::new(),
            name: name.into(),
            storage_type,
            config: config.into(),
        }
    }
}

// The config payload may embed credentials.
impl fmt::Debug for StorageSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageSource")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("storage_type", &self.storage_type)
            .field("config_len", &self.config.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_type_parse() {
        assert_eq!("local".parse::<StorageType>().unwrap(), StorageType::Local);
        assert_eq!("S3".parse::<StorageType>().unwrap(), StorageType::ObjectStore);
        assert!("ftp".parse::<StorageType>().is_err());
    }

    #[test]
    fn test_debug_hides_config() {
        let source = StorageSource::new(
            "minio",
            StorageType::ObjectStore,
            r#"{"secretKey":"hunter2"}"#,
        );
        let debug = format!("{source:?}");
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn test_serializes_type_field() {
        let source = StorageSource::new("local-default", StorageType::Local, "/srv/disk");
        let json = serde_json::to_value(&source).unwrap();
        assert_eq!(json["type"], "local");
    }
}
