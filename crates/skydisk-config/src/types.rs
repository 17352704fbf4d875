use serde::{Deserialize, Serialize};

/// Complete SkyDisk configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Storage backends created at bootstrap.
    pub storage: StorageConfig,
    /// Catalog persistence.
    pub catalog: CatalogConfig,
    /// Short and direct link settings.
    pub links: LinksConfig,
    /// Log output.
    pub logging: LoggingConfig,
}

/// `[storage]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// The default local source.
    pub local: LocalStorageConfig,
    /// The optional S3-compatible source.
    pub s3: S3Config,
}

/// `[storage.local]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalStorageConfig {
    /// Root directory of `local-default`. Relative paths resolve against the
    /// working directory at bootstrap.
    pub base_path: String,
}

impl Default for LocalStorageConfig {
    fn default() -> Self {
        Self {
            base_path: "./data/storage".to_owned(),
        }
    }
}

/// `[storage.s3]` section.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct S3Config {
    /// Register the source at bootstrap.
    pub enabled: bool,
    /// Source name.
    pub name: String,
    /// Service endpoint.
    pub endpoint: String,
    /// Bucket name.
    pub bucket: String,
    /// Access key id.
    pub access_key: String,
    /// Secret access key.
    pub secret_key: String,
    /// Signing region, empty for the service default.
    pub region: String,
    /// Key prefix inside the bucket.
    pub base_path: String,
}

impl Default for S3Config {
    fn default() -> Self {
        Self {
            enabled: false,
            name: "minio-default".to_owned(),
            endpoint: "http://localhost:9000".to_owned(),
            bucket: "cloud-disk".to_owned(),
            access_key: "minioadmin".to_owned(),
            secret_key: "minioadmin".to_owned(),
            region: String::new(),
            base_path: String::new(),
        }
    }
}

impl std::fmt::Debug for S3Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3Config")
            .field("enabled", &self.enabled)
            .field("name", &self.name)
            .field("endpoint", &self.endpoint)
            .field("bucket", &self.bucket)
            .field("access_key", &self.access_key)
            .field("secret_key", &"[REDACTED]")
            .field("region", &self.region)
            .field("base_path", &self.base_path)
            .finish()
    }
}

/// `[catalog]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Snapshot file. Empty keeps the catalog in memory only.
    pub path: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            path: "./data/catalog.json".to_owned(),
        }
    }
}

/// `[links]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinksConfig {
    /// Prefix of generated short-link and download URLs.
    pub public_base_url: String,
    /// Seconds between expired-link purges.
    pub purge_interval_secs: u64,
}

impl Default for LinksConfig {
    fn default() -> Self {
        Self {
            public_base_url: String::new(),
            purge_interval_secs: 3600,
        }
    }
}

/// `[logging]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Base level.
    pub level: String,
    /// `pretty`, `compact`, `json` or `full`.
    pub format: String,
    /// Extra `target=level` directives.
    pub directives: Vec<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            format: "pretty".to_owned(),
            directives: Vec::new(),
        }
    }
}
