//! Local filesystem backend.
//!
//! A local source's config payload is the absolute path of its root
//! directory. Files are stored as `<root>/<dir>/<uuid>-<filename>` so two
//! uploads of the same name never clobber each other; the catalog keeps the
//! virtual name.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use skydisk_core::path::join;
use skydisk_core::{CatalogEntry, DiskError, DiskResult, EntryDraft, StorageSource, StorageType};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::backend::{ByteStream, StorageBackend};
use crate::confine::resolve_within;

/// Backend for [`StorageType::Local`] sources.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalBackend;

impl LocalBackend {
    /// Create the backend.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// The absolute root directory configured for `source`.
    ///
    /// # Errors
    ///
    /// Returns [`DiskError::Config`] when the payload is blank or relative.
    pub fn root_of(source: &StorageSource) -> DiskResult<PathBuf> {
        let raw = source.config.trim();
        if raw.is_empty() {
            return Err(DiskError::Config(format!(
                "local source '{}' has no root path",
                source.name
            )));
        }
        let root = PathBuf::from(raw);
        if !root.is_absolute() {
            return Err(DiskError::Config(format!(
                "local source '{}' root '{raw}' is not absolute",
                source.name
            )));
        }
        Ok(root)
    }

    fn directory_on_disk(root: &Path, directory: &str) -> DiskResult<PathBuf> {
        if directory.is_empty() {
            Ok(root.to_path_buf())
        } else {
            resolve_within(root, directory)
        }
    }
}

#[async_trait]
impl StorageBackend for LocalBackend {
    fn kind(&self) -> StorageType {
        StorageType::Local
    }

    async fn ensure_directory(&self, source: &StorageSource, directory: &str) -> DiskResult<()> {
        let root = Self::root_of(source)?;
        let target = Self::directory_on_disk(&root, directory)?;
        fs::create_dir_all(&target)
            .await
            .map_err(|e| DiskError::io("ensure_directory", source.id, directory, e))?;
        debug!(source_id = %source.id, path = directory, "ensured local directory");
        Ok(())
    }

    async fn store(
        &self,
        source: &StorageSource,
        directory: &str,
        filename: &str,
        content_type: Option<&str>,
        _size: Option<u64>,
        mut reader: ByteStream,
    ) -> DiskResult<EntryDraft> {
        let root = Self::root_of(source)?;
        let virtual_path = join(directory, filename);
        let parent = Self::directory_on_disk(&root, directory)?;
        fs::create_dir_all(&parent)
            .await
            .map_err(|e| DiskError::io("store", source.id, &virtual_path, e))?;

        let stored_name = format!("{}-{filename}", Uuid::new_v4().simple());
        let relative = join(directory, &stored_name);
        let target = resolve_within(&root, &relative)?;

        let mut file = fs::File::create(&target)
            .await
            .map_err(|e| DiskError::io("store", source.id, &virtual_path, e))?;
        let written = match tokio::io::copy(&mut reader, &mut file).await {
            Ok(n) => n,
            Err(e) => {
                drop(file);
                if let Err(cleanup) = fs::remove_file(&target).await {
                    warn!(path = %target.display(), error = %cleanup, "failed to remove partial upload");
                }
                return Err(DiskError::io("store", source.id, &virtual_path, e));
            },
        };
        file.flush()
            .await
            .map_err(|e| DiskError::io("store", source.id, &virtual_path, e))?;
        file.sync_all()
            .await
            .map_err(|e| DiskError::io("store", source.id, &virtual_path, e))?;

        debug!(
            source_id = %source.id,
            path = %virtual_path,
            storage_path = %relative,
            bytes = written,
            "stored local file"
        );
        Ok(EntryDraft {
            storage_source_id: source.id,
            filename: filename.to_owned(),
            directory_path: directory.to_owned(),
            storage_path: relative,
            size: written,
            content_type: content_type.map(str::to_owned),
        })
    }

    async fn load(&self, source: &StorageSource, entry: &CatalogEntry) -> DiskResult<ByteStream> {
        let root = Self::root_of(source)?;
        let target = resolve_within(&root, &entry.storage_path)?;
        match fs::File::open(&target).await {
            Ok(file) => Ok(Box::pin(file)),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(DiskError::NotFound(format!(
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
        let root = Self::root_of(source)?;
        let target = resolve_within(&root, &entry.storage_path)?;
        match fs::remove_file(&target).await {
            Ok(()) => {
                debug!(source_id = %source.id, path = %entry.full_path(), "deleted local file");
                Ok(())
            },
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(DiskError::io("delete", source.id, entry.full_path(), e)),
        }
    }
}
