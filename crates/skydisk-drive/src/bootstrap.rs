//! Building a drive from configuration.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use skydisk_backend::{BackendRegistry, ObjectStoreConfig};
use skydisk_catalog::{CatalogStore, MemoryCatalog};
use skydisk_config::{Config, S3Config};
use skydisk_core::{DiskError, DiskResult, StorageSource, StorageType};
use tracing::{debug, info};

use crate::drive::Drive;

/// Name of the local source created at bootstrap.
pub const LOCAL_SOURCE_NAME: &str = "local-default";

fn absolute(path: &str) -> DiskResult<PathBuf> {
    let path = Path::new(path.trim());
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir()
        .map_err(|e| DiskError::Config(format!("cannot resolve working directory: {e}")))?;
    Ok(cwd.join(path))
}

fn object_store_payload(s3: &S3Config) -> DiskResult<String> {
    let non_blank = |v: &str| {
        let v = v.trim();
        (!v.is_empty()).then(|| v.to_owned())
    };
    ObjectStoreConfig {
        endpoint: s3.endpoint.trim().to_owned(),
        bucket: s3.bucket.trim().to_owned(),
        access_key: s3.access_key.clone(),
        secret_key: s3.secret_key.clone(),
        region: non_blank(&s3.region),
        base_path: non_blank(&s3.base_path),
    }
    .to_payload()
}

async fn open_catalog(config: &Config) -> DiskResult<Arc<dyn CatalogStore>> {
    let raw = config.catalog.path.trim();
    if raw.is_empty() {
        debug!("catalog kept in memory only");
        return Ok(Arc::new(MemoryCatalog::new()));
    }
    let path = absolute(raw)?;
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| DiskError::Catalog(format!("cannot create {}: {e}", parent.display())))?;
    }
    let catalog = MemoryCatalog::open(&path)?;
    info!(path = %path.display(), "opened catalog snapshot");
    Ok(Arc::new(catalog))
}

impl Drive {
    /// Build a drive from `config` with the default backends.
    ///
    /// # Errors
    ///
    /// See [`Drive::bootstrap_with`].
    pub async fn bootstrap(config: &Config) -> DiskResult<Self> {
        Self::bootstrap_with(config, BackendRegistry::with_defaults()).await
    }

    /// Build a drive from `config` using `backends`.
    ///
    /// Opens the catalog, creates the local root directory, and registers
    /// `local-default` plus the configured object-store source when they are
    /// absent. Existing sources are left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`DiskError::Config`] for unusable paths or source configs and
    /// [`DiskError::Catalog`] if the catalog cannot be opened.
    pub async fn bootstrap_with(config: &Config, backends: BackendRegistry) -> DiskResult<Self> {
        let catalog = open_catalog(config).await?;
        let drive = Self::new(catalog, backends, config.links.public_base_url.clone());

        let root = absolute(&config.storage.local.base_path)?;
        tokio::fs::create_dir_all(&root)
            .await
            .map_err(|e| DiskError::Config(format!("cannot create {}: {e}", root.display())))?;
        drive
            .register_if_absent(
                LOCAL_SOURCE_NAME,
                StorageType::Local,
                root.to_string_lossy().into_owned(),
            )
            .await?;

        let s3 = &config.storage.s3;
        if s3.enabled {
            let payload = object_store_payload(s3)?;
            drive
                .register_if_absent(s3.name.trim(), StorageType::ObjectStore, payload)
                .await?;
        }

        Ok(drive)
    }

    async fn register_if_absent(
        &self,
        name: &str,
        storage_type: StorageType,
        config: String,
    ) -> DiskResult<StorageSource> {
        if let Some(existing) = self.tree().catalog().find_source_by_name(name).await? {
            debug!(name, source_id = %existing.id, "storage source already registered");
            return Ok(existing);
        }
        self.register_source(name, storage_type, config).await
    }
}
