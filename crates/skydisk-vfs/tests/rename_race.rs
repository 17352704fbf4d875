//! Renames that interleave between reading descendants and committing.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use skydisk_backend::{BackendRegistry, LocalBackend, byte_stream};
use skydisk_catalog::{CatalogBatch, CatalogResult, CatalogStore, MemoryCatalog};
use skydisk_core::path::{leaf_of, parent_of};
use skydisk_core::{
    CatalogEntry, DiskError, EntryId, ShortLink, SourceId, StorageSource, StorageType,
};
use skydisk_vfs::DirectoryTree;
use tokio::sync::Notify;

/// Delegates to a [`MemoryCatalog`], holding the next descendant query
/// until released.
#[derive(Default)]
struct GatedCatalog {
    inner: MemoryCatalog,
    armed: AtomicBool,
    reached: Notify,
    release: Notify,
}

impl GatedCatalog {
    fn arm(&self) {
        self.armed.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl CatalogStore for GatedCatalog {
    async fn insert_source(&self, source: StorageSource) -> CatalogResult<StorageSource> {
        self.inner.insert_source(source).await
    }

    async fn update_source(&self, source: StorageSource) -> CatalogResult<StorageSource> {
        self.inner.update_source(source).await
    }

    async fn delete_source(&self, id: SourceId) -> CatalogResult<bool> {
        self.inner.delete_source(id).await
    }

    async fn get_source(&self, id: SourceId) -> CatalogResult<Option<StorageSource>> {
        self.inner.get_source(id).await
    }

    async fn find_source_by_name(&self, name: &str) -> CatalogResult<Option<StorageSource>> {
        self.inner.find_source_by_name(name).await
    }

    async fn list_sources(&self) -> CatalogResult<Vec<StorageSource>> {
        self.inner.list_sources().await
    }

    async fn insert_entry(&self, entry: CatalogEntry) -> CatalogResult<CatalogEntry> {
        self.inner.insert_entry(entry).await
    }

    async fn get_entry(&self, id: EntryId) -> CatalogResult<Option<CatalogEntry>> {
        self.inner.get_entry(id).await
    }

    async fn find_directory(
        &self,
        source: SourceId,
        parent: &str,
        name: &str,
    ) -> CatalogResult<Option<CatalogEntry>> {
        self.inner.find_directory(source, parent, name).await
    }

    async fn name_exists(
        &self,
        source: SourceId,
        directory: &str,
        name: &str,
    ) -> CatalogResult<bool> {
        self.inner.name_exists(source, directory, name).await
    }

    async fn list_directory(
        &self,
        source: SourceId,
        directory: &str,
    ) -> CatalogResult<Vec<CatalogEntry>> {
        self.inner.list_directory(source, directory).await
    }

    async fn list_entries(&self, source: Option<SourceId>) -> CatalogResult<Vec<CatalogEntry>> {
        self.inner.list_entries(source).await
    }

    async fn find_descendants(
        &self,
        source: SourceId,
        full_path: &str,
    ) -> CatalogResult<Vec<CatalogEntry>> {
        let found = self.inner.find_descendants(source, full_path).await?;
        if self.armed.swap(false, Ordering::SeqCst) {
            self.reached.notify_one();
            self.release.notified().await;
        }
        Ok(found)
    }

    async fn insert_link(&self, link: ShortLink) -> CatalogResult<ShortLink> {
        self.inner.insert_link(link).await
    }

    async fn find_link_by_token(&self, token: &str) -> CatalogResult<Option<ShortLink>> {
        self.inner.find_link_by_token(token).await
    }

    async fn list_links(&self) -> CatalogResult<Vec<ShortLink>> {
        self.inner.list_links().await
    }

    async fn delete_expired_links(&self, now: DateTime<Utc>) -> CatalogResult<u64> {
        self.inner.delete_expired_links(now).await
    }

    async fn apply(&self, batch: CatalogBatch) -> CatalogResult<()> {
        self.inner.apply(batch).await
    }
}

#[tokio::test]
async fn test_stale_rename_cascade_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = Arc::new(GatedCatalog::default());
    let source = catalog
        .insert_source(StorageSource::new(
            "local-default",
            StorageType::Local,
            dir.path().to_string_lossy().into_owned(),
        ))
        .await
        .unwrap();
    let registry = BackendRegistry::new().with_backend(Arc::new(LocalBackend::new()));
    let tree = DirectoryTree::new(catalog.clone(), registry);

    tree.upload(source.id, "a/c", "f.txt", None, None, byte_stream(b"f".to_vec()))
        .await
        .unwrap();
    let a = catalog.find_directory(source.id, "", "a").await.unwrap().unwrap();
    let c = catalog.find_directory(source.id, "a", "c").await.unwrap().unwrap();

    // Hold `c -> d` after it has read its descendants.
    catalog.arm();
    let held = tokio::spawn({
        let tree = tree.clone();
        async move { tree.rename(c.id, "d").await }
    });
    catalog.reached.notified().await;

    tree.rename(a.id, "b").await.unwrap();
    catalog.release.notify_one();

    let stale = held.await.unwrap();
    assert!(
        matches!(stale, Err(DiskError::Conflict(_))),
        "stale rename should conflict, got {stale:?}"
    );

    let entries = catalog.list_entries(Some(source.id)).await.unwrap();
    let paths: BTreeSet<String> = entries.iter().map(CatalogEntry::full_path).collect();
    assert_eq!(
        paths,
        BTreeSet::from(["b".to_owned(), "b/c".to_owned(), "b/c/f.txt".to_owned()])
    );
    for entry in entries.iter().filter(|e| !e.directory_path.is_empty()) {
        let parent = catalog
            .find_directory(
                source.id,
                parent_of(&entry.directory_path),
                leaf_of(&entry.directory_path),
            )
            .await
            .unwrap();
        assert!(parent.is_some(), "{} has no parent directory", entry.full_path());
    }
}
