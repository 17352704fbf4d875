use std::sync::Arc;

use skydisk_backend::{BackendRegistry, ByteStream, StorageBackend};
use skydisk_catalog::{CatalogBatch, CatalogError, CatalogStore};
use skydisk_core::path::{ancestry, normalize_directory, normalize_filename, rebase};
use skydisk_core::{CatalogEntry, DiskError, DiskResult, EntryId, SourceId, StorageSource};
use tracing::{debug, info, warn};

/// Tree operations over a catalog and the backends that hold file content.
#[derive(Clone)]
pub struct DirectoryTree {
    catalog: Arc<dyn CatalogStore>,
    backends: BackendRegistry,
}

impl std::fmt::Debug for DirectoryTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectoryTree")
            .field("backends", &self.backends)
            .finish_non_exhaustive()
    }
}

impl DirectoryTree {
    /// Create a tree manager.
    #[must_use]
    pub fn new(catalog: Arc<dyn CatalogStore>, backends: BackendRegistry) -> Self {
        Self { catalog, backends }
    }

    /// The underlying catalog.
    #[must_use]
    pub fn catalog(&self) -> &Arc<dyn CatalogStore> {
        &self.catalog
    }

    /// The backend registry.
    #[must_use]
    pub fn backends(&self) -> &BackendRegistry {
        &self.backends
    }

    /// Look up a storage source.
    ///
    /// # Errors
    ///
    /// Returns [`DiskError::NotFound`] if the source does not exist.
    pub async fn source(&self, id: SourceId) -> DiskResult<StorageSource> {
        self.catalog
            .get_source(id)
            .await?
            .ok_or_else(|| DiskError::NotFound(format!("storage source {id}")))
    }

    /// Look up an entry.
    ///
    /// # Errors
    ///
    /// Returns [`DiskError::NotFound`] if the entry does not exist.
    pub async fn entry(&self, id: EntryId) -> DiskResult<CatalogEntry> {
        self.catalog
            .get_entry(id)
            .await?
            .ok_or_else(|| DiskError::NotFound(format!("entry {id}")))
    }

    /// Resolve an entry together with its source and backend.
    ///
    /// # Errors
    ///
    /// Returns [`DiskError::NotFound`] for a missing entry or source, and
    /// [`DiskError::Config`] when no backend serves the source.
    pub async fn locate(
        &self,
        id: EntryId,
    ) -> DiskResult<(CatalogEntry, StorageSource, Arc<dyn StorageBackend>)> {
        let entry = self.entry(id).await?;
        let source = self.source(entry.storage_source_id).await?;
        let backend = self.backends.resolve(&source)?;
        Ok((entry, source, backend))
    }

    /// Make sure every segment of `path` exists as a directory entry.
    ///
    /// Returns the leaf directory, or `None` for the root. When a concurrent
    /// caller inserts the same directory first, its entry is adopted.
    ///
    /// # Errors
    ///
    /// Returns [`DiskError::InvalidPath`] for a malformed path.
    pub async fn ensure_directory_chain(
        &self,
        source: SourceId,
        path: &str,
    ) -> DiskResult<Option<CatalogEntry>> {
        let path = normalize_directory(path)?;
        let mut leaf = None;
        for (parent, segment) in ancestry(&path) {
            if let Some(existing) = self.catalog.find_directory(source, &parent, segment).await? {
                leaf = Some(existing);
                continue;
            }
            let fresh = CatalogEntry::directory(source, parent.clone(), segment);
            let entry = match self.catalog.insert_entry(fresh).await {
                Ok(inserted) => {
                    debug!(source_id = %source, path = %inserted.full_path(), "created directory entry");
                    inserted
                },
                Err(CatalogError::UniqueViolation(_)) => self
                    .catalog
                    .find_directory(source, &parent, segment)
                    .await?
                    .ok_or_else(|| {
                        DiskError::Conflict(format!(
                            "directory '{segment}' under '{parent}' vanished while being created"
                        ))
                    })?,
                Err(e) => return Err(e.into()),
            };
            leaf = Some(entry);
        }
        Ok(leaf)
    }

    /// Entries directly inside `directory`, directories first, then newest.
    ///
    /// # Errors
    ///
    /// Returns [`DiskError::NotFound`] for an unknown source and
    /// [`DiskError::InvalidPath`] for a malformed directory.
    pub async fn browse(&self, source: SourceId, directory: &str) -> DiskResult<Vec<CatalogEntry>> {
        self.source(source).await?;
        let directory = normalize_directory(directory)?;
        Ok(self.catalog.list_directory(source, &directory).await?)
    }

    /// Every entry of one source, or of all sources, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`DiskError::NotFound`] for an unknown source.
    pub async fn list_files(&self, source: Option<SourceId>) -> DiskResult<Vec<CatalogEntry>> {
        if let Some(id) = source {
            self.source(id).await?;
        }
        Ok(self.catalog.list_entries(source).await?)
    }

    /// Create `path` and any missing ancestors.
    ///
    /// # Errors
    ///
    /// Returns [`DiskError::InvalidPath`] for a blank or malformed path.
    pub async fn create_directory(&self, source: SourceId, path: &str) -> DiskResult<CatalogEntry> {
        let path = normalize_directory(path)?;
        if path.is_empty() {
            return Err(DiskError::InvalidPath("directory path cannot be blank".into()));
        }
        let src = self.source(source).await?;
        let backend = self.backends.resolve(&src)?;
        backend.ensure_directory(&src, &path).await?;
        let leaf = self
            .ensure_directory_chain(source, &path)
            .await?
            .ok_or_else(|| DiskError::InvalidPath(format!("'{path}' names the root")))?;
        info!(source_id = %source, path = %path, "created directory");
        Ok(leaf)
    }

    /// Store a file and catalog it.
    ///
    /// The physical write happens before the catalog insert. If the insert
    /// fails, the written object is removed again.
    ///
    /// # Errors
    ///
    /// Returns [`DiskError::InvalidPath`] or [`DiskError::InvalidFilename`]
    /// for malformed input and [`DiskError::Io`] for backend failures.
    pub async fn upload(
        &self,
        source: SourceId,
        directory: &str,
        filename: &str,
        content_type: Option<&str>,
        size: Option<u64>,
        reader: ByteStream,
    ) -> DiskResult<CatalogEntry> {
        let directory = normalize_directory(directory)?;
        let filename = normalize_filename(filename)?;
        let src = self.source(source).await?;
        let backend = self.backends.resolve(&src)?;

        backend.ensure_directory(&src, &directory).await?;
        self.ensure_directory_chain(source, &directory).await?;

        let draft = backend
            .store(&src, &directory, &filename, content_type, size, reader)
            .await?;
        let entry = CatalogEntry::from_draft(draft);
        match self.catalog.insert_entry(entry.clone()).await {
            Ok(entry) => {
                info!(
                    source_id = %source,
                    entry_id = %entry.id,
                    path = %entry.full_path(),
                    size = entry.size,
                    "uploaded file"
                );
                Ok(entry)
            },
            Err(e) => {
                if let Err(cleanup) = backend.delete(&src, &entry).await {
                    warn!(
                        source_id = %source,
                        storage_path = %entry.storage_path,
                        error = %cleanup,
                        "failed to remove uncataloged object"
                    );
                }
                Err(e.into())
            },
        }
    }

    /// Rename an entry in place.
    ///
    /// For a directory, every descendant's parent path is rewritten in the
    /// same atomic batch. Physical objects keep their locators. The batch
    /// only commits if none of the rows it rewrites moved after they were
    /// read.
    ///
    /// # Errors
    ///
    /// Returns [`DiskError::InvalidFilename`] for a malformed name,
    /// [`DiskError::NotFound`] for a missing entry and [`DiskError::Conflict`]
    /// when the destination name is taken or a concurrent change moved the
    /// entry or one of its descendants.
    pub async fn rename(&self, id: EntryId, new_name: &str) -> DiskResult<CatalogEntry> {
        let new_name = normalize_filename(new_name)?;
        let entry = self.entry(id).await?;
        if entry.filename == new_name {
            return Ok(entry);
        }
        let source = entry.storage_source_id;
        if self
            .catalog
            .name_exists(source, &entry.directory_path, &new_name)
            .await?
        {
            return Err(DiskError::Conflict(format!(
                "'{new_name}' already exists in '{}'",
                entry.directory_path
            )));
        }

        let mut renamed = entry.clone();
        renamed.filename.clone_from(&new_name);
        let mut batch =
            CatalogBatch::new().require_vacant(source, &entry.directory_path, &new_name, Some(id));

        let mut rewritten = 0_usize;
        if entry.is_directory {
            let old_path = entry.full_path();
            let new_path = renamed.full_path();
            for child in self.catalog.find_descendants(source, &old_path).await? {
                if let Some(moved) = rebase(&child.directory_path, &old_path, &new_path) {
                    let mut rebased = child.clone();
                    rebased.directory_path = moved;
                    batch = batch.update_entry(&child, rebased);
                    rewritten = rewritten.saturating_add(1);
                }
            }
        }
        batch = batch.update_entry(&entry, renamed.clone());

        self.catalog.apply(batch).await.map_err(|e| match e {
            CatalogError::PreconditionFailed(reason) | CatalogError::UniqueViolation(reason) => {
                DiskError::Conflict(format!(
                    "cannot rename '{}' to '{new_name}': {reason}",
                    entry.full_path()
                ))
            },
            other => other.into(),
        })?;
        info!(
            entry_id = %id,
            from = %entry.full_path(),
            to = %renamed.full_path(),
            descendants = rewritten,
            "renamed entry"
        );
        Ok(renamed)
    }

    /// Delete an entry and, for a directory, everything beneath it.
    ///
    /// Links are removed first, then physical objects, then catalog rows.
    /// Each step is idempotent, so a failed delete can be retried.
    ///
    /// # Errors
    ///
    /// Returns [`DiskError::NotFound`] for a missing entry and
    /// [`DiskError::Io`] when a physical delete fails.
    pub async fn delete(&self, id: EntryId) -> DiskResult<()> {
        let (entry, source, backend) = self.locate(id).await?;

        let mut targets = if entry.is_directory {
            self.catalog
                .find_descendants(entry.storage_source_id, &entry.full_path())
                .await?
        } else {
            Vec::new()
        };
        targets.push(entry.clone());

        let unlink = targets
            .iter()
            .fold(CatalogBatch::new(), |batch, t| batch.delete_links_for(t.id));
        self.catalog.apply(unlink).await?;

        for target in targets.iter().filter(|t| !t.is_directory) {
            backend.delete(&source, target).await?;
        }

        let rows = targets
            .iter()
            .fold(CatalogBatch::new(), |batch, t| batch.delete_entry(t.id));
        self.catalog.apply(rows).await?;

        info!(
            entry_id = %id,
            path = %entry.full_path(),
            removed = targets.len(),
            "deleted entry"
        );
        Ok(())
    }
}
