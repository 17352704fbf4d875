//! S3-compatible object-store backend.
//!
//! Objects are keyed deterministically as `<basePath>/<dir>/<filename>`.
//! Directories are materialized as zero-byte marker objects ending in `/`.
//! One client is cached per source and rebuilt when the source config
//! changes.

mod client;
mod config;
mod memory;
mod s3;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use skydisk_core::path::join;
use skydisk_core::{
    CatalogEntry, DEFAULT_CONTENT_TYPE, DiskError, DiskResult, EntryDraft, SourceId,
    StorageSource, StorageType,
};
use tokio::io::AsyncReadExt;
use tracing::{debug, info, warn};

pub use self::client::{ClientFactory, ObjectClient, ObjectStoreError};
pub use self::config::{DEFAULT_REGION, ObjectStoreConfig};
pub use self::memory::MemoryObjectClient;
pub use self::s3::S3Client;

use crate::backend::{ByteStream, StorageBackend, byte_stream};
use crate::confine::check_object_key;

/// Content type of directory marker objects.
pub const DIRECTORY_MARKER_CONTENT_TYPE: &str = "application/x-directory";

/// Shortest presigned URL lifetime handed out.
pub const MIN_PRESIGN_TTL: Duration = Duration::from_secs(60);

/// Longest presigned URL lifetime handed out.
pub const MAX_PRESIGN_TTL: Duration = Duration::from_secs(604_800);

/// Presigned URL lifetime when the caller does not ask for one.
pub const DEFAULT_PRESIGN_TTL: Duration = Duration::from_secs(3_600);

/// Clamp a requested presign lifetime into the supported window.
#[must_use]
pub fn clamp_ttl(ttl: Option<Duration>) -> Duration {
    ttl.unwrap_or(DEFAULT_PRESIGN_TTL)
        .clamp(MIN_PRESIGN_TTL, MAX_PRESIGN_TTL)
}

/// Object key for `filename` under `directory`, below `prefix`.
#[must_use]
pub fn object_key(prefix: &str, directory: &str, filename: &str) -> String {
    join(prefix, &join(directory, filename))
}

struct CachedClient {
    fingerprint: u64,
    client: Arc<dyn ObjectClient>,
}

/// Backend for [`StorageType::ObjectStore`] sources.
pub struct ObjectStoreBackend {
    factory: ClientFactory,
    clients: DashMap<SourceId, CachedClient>,
}

impl Default for ObjectStoreBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ObjectStoreBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectStoreBackend")
            .field("cached_clients", &self.clients.len())
            .finish_non_exhaustive()
    }
}

impl ObjectStoreBackend {
    /// Backend that talks to real S3-compatible services.
    #[must_use]
    pub fn new() -> Self {
        Self::with_client_factory(Arc::new(|config: &ObjectStoreConfig| {
            let client: Arc<dyn ObjectClient> = Arc::new(S3Client::connect(config)?);
            Ok(client)
        }))
    }

    /// Backend that builds clients with `factory`.
    #[must_use]
    pub fn with_client_factory(factory: ClientFactory) -> Self {
        Self {
            factory,
            clients: DashMap::new(),
        }
    }

    /// Backend that hands out the same client for every source.
    #[must_use]
    pub fn with_client(client: Arc<dyn ObjectClient>) -> Self {
        Self::with_client_factory(Arc::new(move |_: &ObjectStoreConfig| Ok(Arc::clone(&client))))
    }

    /// Number of sources with a cached client.
    #[must_use]
    pub fn cached_clients(&self) -> usize {
        self.clients.len()
    }

    fn client_for(
        &self,
        source: &StorageSource,
        config: &ObjectStoreConfig,
    ) -> DiskResult<Arc<dyn ObjectClient>> {
        let fingerprint = config.fingerprint();
        if let Some(cached) = self.clients.get(&source.id) {
            if cached.fingerprint == fingerprint {
                return Ok(Arc::clone(&cached.client));
            }
        }
        let client = (self.factory)(config)?;
        self.clients.insert(
            source.id,
            CachedClient {
                fingerprint,
                client: Arc::clone(&client),
            },
        );
        debug!(source_id = %source.id, "cached object-store client");
        Ok(client)
    }

    async fn ensure_bucket(
        &self,
        source: &StorageSource,
        client: &dyn ObjectClient,
        config: &ObjectStoreConfig,
    ) -> DiskResult<()> {
        let exists = client
            .bucket_exists()
            .await
            .map_err(|e| DiskError::io("bucket_exists", source.id, &config.bucket, e))?;
        if exists {
            return Ok(());
        }
        match client.create_bucket().await {
            Ok(()) => {
                info!(source_id = %source.id, bucket = %config.bucket, "created bucket");
                Ok(())
            },
            Err(e) if matches!(e.status(), Some(403 | 409)) => {
                warn!(
                    source_id = %source.id,
                    bucket = %config.bucket,
                    error = %e,
                    "bucket creation refused, assuming it exists"
                );
                Ok(())
            },
            Err(e) => Err(DiskError::io("create_bucket", source.id, &config.bucket, e)),
        }
    }

    fn checked_key(config: &ObjectStoreConfig, entry: &CatalogEntry) -> DiskResult<String> {
        let prefix = config.prefix()?;
        check_object_key(&prefix, &entry.storage_path)?;
        Ok(entry.storage_path.clone())
    }
}

#[async_trait]
impl StorageBackend for ObjectStoreBackend {
    fn kind(&self) -> StorageType {
        StorageType::ObjectStore
    }

    async fn ensure_directory(&self, source: &StorageSource, directory: &str) -> DiskResult<()> {
        let config = ObjectStoreConfig::from_source(source)?;
        let client = self.client_for(source, &config)?;
        self.ensure_bucket(source, client.as_ref(), &config).await?;
        if directory.is_empty() {
            return Ok(());
        }
        let marker = format!("{}/", join(&config.prefix()?, directory));
        client
            .put_object(&marker, DIRECTORY_MARKER_CONTENT_TYPE, Vec::new())
            .await
            .map_err(|e| DiskError::io("ensure_directory", source.id, directory, e))?;
        debug!(source_id = %source.id, key = %marker, "wrote directory marker");
        Ok(())
    }

    async fn store(
        &self,
        source: &StorageSource,
        directory: &str,
        filename: &str,
        content_type: Option<&str>,
        size: Option<u64>,
        mut reader: ByteStream,
    ) -> DiskResult<EntryDraft> {
        let config = ObjectStoreConfig::from_source(source)?;
        let prefix = config.prefix()?;
        let key = object_key(&prefix, directory, filename);
        check_object_key(&prefix, &key)?;
        let virtual_path = join(directory, filename);

        let client = self.client_for(source, &config)?;
        self.ensure_bucket(source, client.as_ref(), &config).await?;

        let capacity = size
            .and_then(|s| usize::try_from(s).ok())
            .unwrap_or_default();
        let mut body = Vec::with_capacity(capacity);
        reader
            .read_to_end(&mut body)
            .await
            .map_err(|e| DiskError::io("store", source.id, &virtual_path, e))?;
        let written = u64::try_from(body.len()).unwrap_or(u64::MAX);

        let stored_type = content_type
            .map(str::trim)
            .filter(|ct| !ct.is_empty())
            .unwrap_or(DEFAULT_CONTENT_TYPE);
        client
            .put_object(&key, stored_type, body)
            .await
            .map_err(|e| DiskError::io("store", source.id, &virtual_path, e))?;

        debug!(source_id = %source.id, key = %key, bytes = written, "stored object");
        Ok(EntryDraft {
            storage_source_id: source.id,
            filename: filename.to_owned(),
            directory_path: directory.to_owned(),
            storage_path: key,
            size: written,
            content_type: content_type.map(str::to_owned),
        })
    }

    async fn load(&self, source: &StorageSource, entry: &CatalogEntry) -> DiskResult<ByteStream> {
        let config = ObjectStoreConfig::from_source(source)?;
        let key = Self::checked_key(&config, entry)?;
        let client = self.client_for(source, &config)?;
        match client.get_object(&key).await {
            Ok(body) => Ok(byte_stream(body)),
            Err(e) if e.is_not_found() => Err(DiskError::NotFound(format!(
                "content of '{}' is missing from storage",
                entry.full_path()
            ))),
            Err(e) => Err(DiskError::io("load", source.id, entry.full_path(), e)),
        }
    }

    async fn delete(&self, source: &StorageSource, entry: &CatalogEntry) -> DiskResult<()> {
        if entry.is_directory {
            return Ok(());
        }
        let config = ObjectStoreConfig::from_source(source)?;
        let key = Self::checked_key(&config, entry)?;
        let client = self.client_for(source, &config)?;
        match client.delete_object(&key).await {
            Ok(()) => {
                debug!(source_id = %source.id, key = %key, "deleted object");
                Ok(())
            },
            Err(e) if e.is_not_found() => Ok(()),
            Err(e) => Err(DiskError::io("delete", source.id, entry.full_path(), e)),
        }
    }

    async fn presigned_url(
        &self,
        source: &StorageSource,
        entry: &CatalogEntry,
        ttl: Option<Duration>,
    ) -> DiskResult<Option<String>> {
        if entry.is_directory {
            return Ok(None);
        }
        let config = ObjectStoreConfig::from_source(source)?;
        let key = Self::checked_key(&config, entry)?;
        let client = self.client_for(source, &config)?;
        let url = client
            .presign_get(&key, clamp_ttl(ttl))
            .await
            .map_err(|e| DiskError::io("presign", source.id, entry.full_path(), e))?;
        Ok(Some(url))
    }

    fn invalidate(&self, source_id: SourceId) {
        if self.clients.remove(&source_id).is_some() {
            debug!(source_id = %source_id, "dropped cached object-store client");
        }
    }
}
