//! The drive: every user-facing operation in one place.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use skydisk_backend::{BackendRegistry, ByteStream, LocalBackend, ObjectStoreConfig};
use skydisk_catalog::CatalogStore;
use skydisk_core::{
    CatalogEntry, DiskError, DiskResult, EntryId, ShortLink, SourceId, StorageSource, StorageType,
};
use skydisk_links::{DirectLink, LinkIssuer, ResolvedLink};
use skydisk_telemetry::RequestContext;
use skydisk_vfs::DirectoryTree;
use tracing::{Instrument, info};

use crate::download::{Disposition, FileDownload, ShortLinkGrant};

/// Run `fut` inside the context's span and log its outcome.
async fn traced<T>(ctx: RequestContext, fut: impl Future<Output = DiskResult<T>>) -> DiskResult<T> {
    let span = ctx.span();
    let result = fut.instrument(span.clone()).await;
    span.in_scope(|| ctx.finish(&result));
    result
}

/// Check that a source's config payload parses for its type.
fn check_source_config(source: &StorageSource) -> DiskResult<()> {
    match source.storage_type {
        StorageType::Local => LocalBackend::root_of(source).map(|_| ()),
        StorageType::ObjectStore => ObjectStoreConfig::from_source(source).map(|_| ()),
        _ => Ok(()),
    }
}

/// Multi-backend file drive.
///
/// Cheap to clone; clones share the catalog, cached backend clients and link
/// issuer.
#[derive(Clone)]
pub struct Drive {
    tree: DirectoryTree,
    links: LinkIssuer,
}

impl std::fmt::Debug for Drive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Drive")
            .field("links", &self.links)
            .finish_non_exhaustive()
    }
}

impl Drive {
    /// Assemble a drive from its parts.
    #[must_use]
    pub fn new(
        catalog: Arc<dyn CatalogStore>,
        backends: BackendRegistry,
        public_base_url: impl Into<String>,
    ) -> Self {
        let links = LinkIssuer::new(Arc::clone(&catalog), public_base_url);
        Self {
            tree: DirectoryTree::new(catalog, backends),
            links,
        }
    }

    /// The underlying directory tree.
    #[must_use]
    pub fn tree(&self) -> &DirectoryTree {
        &self.tree
    }

    /// The link issuer.
    #[must_use]
    pub fn links(&self) -> &LinkIssuer {
        &self.links
    }

    fn catalog(&self) -> &Arc<dyn CatalogStore> {
        self.tree.catalog()
    }

    /// Every storage source, ordered by name.
    ///
    /// # Errors
    ///
    /// Returns [`DiskError::Catalog`] if the catalog is unavailable.
    pub async fn list_storage_sources(&self) -> DiskResult<Vec<StorageSource>> {
        let ctx = RequestContext::new("list_storage_sources");
        traced(ctx, async { Ok(self.catalog().list_sources().await?) }).await
    }

    /// Find a source by id or, failing that, by name.
    ///
    /// # Errors
    ///
    /// Returns [`DiskError::NotFound`] if nothing matches.
    pub async fn find_source(&self, reference: &str) -> DiskResult<StorageSource> {
        let reference = reference.trim();
        if let Ok(id) = reference.parse::<SourceId>()
            && let Some(source) = self.catalog().get_source(id).await?
        {
            return Ok(source);
        }
        self.catalog()
            .find_source_by_name(reference)
            .await?
            .ok_or_else(|| DiskError::NotFound(format!("storage source '{reference}'")))
    }

    /// Register a new storage source.
    ///
    /// # Errors
    ///
    /// Returns [`DiskError::Config`] if the name is blank, the config payload
    /// does not parse, or no backend serves the type, and
    /// [`DiskError::Conflict`] if the name is taken.
    pub async fn register_source(
        &self,
        name: &str,
        storage_type: StorageType,
        config: impl Into<String>,
    ) -> DiskResult<StorageSource> {
        let ctx = RequestContext::new("register_source").with_path(name);
        let source = StorageSource::new(name.trim(), storage_type, config);
        traced(ctx, async {
            if source.name.is_empty() {
                return Err(DiskError::Config("storage source name cannot be blank".into()));
            }
            check_source_config(&source)?;
            self.tree.backends().resolve(&source)?;
            let source = self.catalog().insert_source(source).await?;
            info!(source_id = %source.id, name = %source.name, kind = %source.storage_type, "registered storage source");
            Ok(source)
        })
        .await
    }

    /// Replace the config payload of a source and drop its cached clients.
    ///
    /// # Errors
    ///
    /// Returns [`DiskError::NotFound`] for an unknown source and
    /// [`DiskError::Config`] if the payload does not parse.
    pub async fn update_source_config(
        &self,
        id: SourceId,
        config: impl Into<String>,
    ) -> DiskResult<StorageSource> {
        let ctx = RequestContext::new("update_source_config").with_source(id);
        let config = config.into();
        traced(ctx, async {
            let mut source = self.tree.source(id).await?;
            source.config = config;
            check_source_config(&source)?;
            let source = self.catalog().update_source(source).await?;
            self.tree.backends().invalidate(id);
            info!(source_id = %id, "updated storage source config");
            Ok(source)
        })
        .await
    }

    /// Remove a source that no entry references.
    ///
    /// Returns `true` if the source existed.
    ///
    /// # Errors
    ///
    /// Returns [`DiskError::Conflict`] while entries still reference it.
    pub async fn remove_source(&self, id: SourceId) -> DiskResult<bool> {
        let ctx = RequestContext::new("remove_source").with_source(id);
        traced(ctx, async {
            let existed = self.catalog().delete_source(id).await?;
            self.tree.backends().invalidate(id);
            if existed {
                info!(source_id = %id, "removed storage source");
            }
            Ok(existed)
        })
        .await
    }

    /// Store a file under `directory`, creating missing directories.
    ///
    /// # Errors
    ///
    /// Returns [`DiskError::InvalidPath`] or [`DiskError::InvalidFilename`]
    /// for malformed input, [`DiskError::NotFound`] for an unknown source and
    /// [`DiskError::Io`] for backend failures.
    pub async fn upload(
        &self,
        source: SourceId,
        directory: &str,
        filename: &str,
        content_type: Option<&str>,
        size: Option<u64>,
        reader: ByteStream,
    ) -> DiskResult<CatalogEntry> {
        let ctx = RequestContext::new("upload")
            .with_source(source)
            .with_path(directory);
        traced(
            ctx,
            self.tree
                .upload(source, directory, filename, content_type, size, reader),
        )
        .await
    }

    /// Immediate children of `directory`: directories first, then newest first.
    ///
    /// # Errors
    ///
    /// Returns [`DiskError::InvalidPath`] or [`DiskError::NotFound`].
    pub async fn browse(&self, source: SourceId, directory: &str) -> DiskResult<Vec<CatalogEntry>> {
        let ctx = RequestContext::new("browse")
            .with_source(source)
            .with_path(directory);
        traced(ctx, self.tree.browse(source, directory)).await
    }

    /// Every entry of one source, or of all sources, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`DiskError::NotFound`] for an unknown source.
    pub async fn list_files(&self, source: Option<SourceId>) -> DiskResult<Vec<CatalogEntry>> {
        let mut ctx = RequestContext::new("list_files");
        if let Some(id) = source {
            ctx = ctx.with_source(id);
        }
        traced(ctx, self.tree.list_files(source)).await
    }

    /// Create a directory and any missing ancestors.
    ///
    /// # Errors
    ///
    /// Returns [`DiskError::InvalidPath`] for a blank or malformed path.
    pub async fn create_directory(&self, source: SourceId, path: &str) -> DiskResult<CatalogEntry> {
        let ctx = RequestContext::new("create_directory")
            .with_source(source)
            .with_path(path);
        traced(ctx, self.tree.create_directory(source, path)).await
    }

    async fn open(&self, id: EntryId, disposition: Disposition) -> DiskResult<FileDownload> {
        let (entry, source, backend) = self.tree.locate(id).await?;
        if entry.is_directory {
            return Err(DiskError::InvalidTarget(format!(
                "'{}' is a directory and cannot be downloaded",
                entry.full_path()
            )));
        }
        let reader = backend.load(&source, &entry).await?;
        Ok(FileDownload {
            reader,
            content_type: entry.effective_content_type().to_owned(),
            size: entry.size,
            filename: entry.filename,
            disposition,
        })
    }

    /// Open a file for download.
    ///
    /// # Errors
    ///
    /// Returns [`DiskError::InvalidTarget`] for directories and
    /// [`DiskError::NotFound`] if the entry or its object is gone.
    pub async fn download(&self, id: EntryId) -> DiskResult<FileDownload> {
        let ctx = RequestContext::new("download").with_entry(id);
        traced(ctx, self.open(id, Disposition::Attachment)).await
    }

    /// Open a file for inline display.
    ///
    /// # Errors
    ///
    /// See [`Drive::download`].
    pub async fn preview(&self, id: EntryId) -> DiskResult<FileDownload> {
        let ctx = RequestContext::new("preview").with_entry(id);
        traced(ctx, self.open(id, Disposition::Inline)).await
    }

    /// Rename an entry in place.
    ///
    /// # Errors
    ///
    /// Returns [`DiskError::InvalidFilename`], [`DiskError::NotFound`] or
    /// [`DiskError::Conflict`].
    pub async fn rename(&self, id: EntryId, new_name: &str) -> DiskResult<CatalogEntry> {
        let ctx = RequestContext::new("rename").with_entry(id);
        traced(ctx, self.tree.rename(id, new_name)).await
    }

    /// Delete an entry and, for directories, everything below it.
    ///
    /// # Errors
    ///
    /// Returns [`DiskError::NotFound`] for an unknown entry.
    pub async fn delete(&self, id: EntryId) -> DiskResult<()> {
        let ctx = RequestContext::new("delete").with_entry(id);
        traced(ctx, self.tree.delete(id)).await
    }

    /// Create a short link to a file.
    ///
    /// # Errors
    ///
    /// Returns [`DiskError::InvalidTarget`] for directories and
    /// [`DiskError::NotFound`] for an unknown entry.
    pub async fn create_short_link(
        &self,
        id: EntryId,
        ttl: Option<Duration>,
        access_code: Option<&str>,
    ) -> DiskResult<ShortLinkGrant> {
        let ctx = RequestContext::new("create_short_link").with_entry(id);
        traced(ctx, async {
            let entry = self.tree.entry(id).await?;
            let link = self.links.create(&entry, ttl, access_code).await?;
            Ok(ShortLinkGrant {
                url: self.links.short_url(&link.token),
                token: link.token,
                access_code: link.access_code,
            })
        })
        .await
    }

    /// Best URL for reading a file directly.
    ///
    /// A short link is only minted when the caller passes a positive `ttl`.
    /// Without one, a backend that cannot presign yields the download
    /// endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`DiskError::InvalidTarget`] for directories and
    /// [`DiskError::NotFound`] for an unknown entry.
    pub async fn create_direct_link(
        &self,
        id: EntryId,
        ttl: Option<Duration>,
    ) -> DiskResult<DirectLink> {
        let ctx = RequestContext::new("create_direct_link").with_entry(id);
        traced(ctx, async {
            let (entry, source, backend) = self.tree.locate(id).await?;
            self.links
                .direct_link(&entry, &source, backend.as_ref(), ttl)
                .await
        })
        .await
    }

    /// Check a short link and return what it points at.
    ///
    /// # Errors
    ///
    /// Returns [`DiskError::NotFound`], [`DiskError::Expired`] or
    /// [`DiskError::AccessDenied`].
    pub async fn resolve_short_link(
        &self,
        token: &str,
        access_code: Option<&str>,
    ) -> DiskResult<ResolvedLink> {
        let ctx = RequestContext::new("resolve_short_link");
        traced(ctx, self.links.resolve(token, access_code)).await
    }

    /// Resolve a short link and open its file for inline display.
    ///
    /// # Errors
    ///
    /// See [`Drive::resolve_short_link`] and [`Drive::download`].
    pub async fn open_short_link(
        &self,
        token: &str,
        access_code: Option<&str>,
    ) -> DiskResult<FileDownload> {
        let ctx = RequestContext::new("open_short_link");
        traced(ctx, async {
            let resolved = self.links.resolve(token, access_code).await?;
            self.open(resolved.entry.id, Disposition::Inline).await
        })
        .await
    }

    /// Every short link, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`DiskError::Catalog`] if the catalog is unavailable.
    pub async fn list_short_links(&self) -> DiskResult<Vec<ShortLink>> {
        let ctx = RequestContext::new("list_short_links");
        traced(ctx, self.links.list()).await
    }

    /// Delete expired short links now. Returns how many were removed.
    ///
    /// # Errors
    ///
    /// Returns [`DiskError::Catalog`] if the catalog is unavailable.
    pub async fn purge_expired_links(&self) -> DiskResult<u64> {
        let ctx = RequestContext::new("purge_expired_links");
        traced(ctx, self.links.cleanup_expired()).await
    }
}
