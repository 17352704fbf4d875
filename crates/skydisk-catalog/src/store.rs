//! The catalog store contract.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use skydisk_core::{CatalogEntry, EntryId, ShortLink, SourceId, StorageSource};

use crate::batch::CatalogBatch;
use crate::error::CatalogResult;

/// Durable record collection for storage sources, catalog entries and links.
///
/// Implementations must be thread-safe and support:
/// - Single-record create/read/update/delete
/// - Equality queries and the prefix-or-equality descendant query
/// - A uniqueness constraint on `(source, directory_path, filename)` among
///   directories, on source names, and on link tokens, reported as
///   [`CatalogError::UniqueViolation`](crate::CatalogError::UniqueViolation)
/// - Atomic application of a [`CatalogBatch`]
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Insert a new storage source.
    ///
    /// # Errors
    ///
    /// Returns `UniqueViolation` if the name is taken.
    async fn insert_source(&self, source: StorageSource) -> CatalogResult<StorageSource>;

    /// Replace an existing storage source.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the source does not exist, `UniqueViolation` if
    /// the new name collides with another source.
    async fn update_source(&self, source: StorageSource) -> CatalogResult<StorageSource>;

    /// Remove a storage source.
    ///
    /// Returns `true` if the source existed.
    ///
    /// # Errors
    ///
    /// Returns `PreconditionFailed` if any entry still references the source.
    async fn delete_source(&self, id: SourceId) -> CatalogResult<bool>;

    /// Fetch a storage source by id.
    async fn get_source(&self, id: SourceId) -> CatalogResult<Option<StorageSource>>;

    /// Fetch a storage source by its unique name.
    async fn find_source_by_name(&self, name: &str) -> CatalogResult<Option<StorageSource>>;

    /// List every storage source, ordered by name.
    async fn list_sources(&self) -> CatalogResult<Vec<StorageSource>>;

    /// Insert a new entry.
    ///
    /// # Errors
    ///
    /// Returns `UniqueViolation` if the entry is a directory and the slot is
    /// already held by another directory.
    async fn insert_entry(&self, entry: CatalogEntry) -> CatalogResult<CatalogEntry>;

    /// Fetch an entry by id.
    async fn get_entry(&self, id: EntryId) -> CatalogResult<Option<CatalogEntry>>;

    /// Find the directory named `name` directly under `parent`.
    async fn find_directory(
        &self,
        source: SourceId,
        parent: &str,
        name: &str,
    ) -> CatalogResult<Option<CatalogEntry>>;

    /// Whether any entry occupies `(source, directory, name)`.
    async fn name_exists(&self, source: SourceId, directory: &str, name: &str)
    -> CatalogResult<bool>;

    /// Entries whose parent is exactly `directory`, directories first, then
    /// newest first.
    async fn list_directory(
        &self,
        source: SourceId,
        directory: &str,
    ) -> CatalogResult<Vec<CatalogEntry>>;

    /// All entries of one source, or of every source, newest first.
    async fn list_entries(&self, source: Option<SourceId>) -> CatalogResult<Vec<CatalogEntry>>;

    /// Entries whose parent is `full_path` or lies underneath it.
    async fn find_descendants(
        &self,
        source: SourceId,
        full_path: &str,
    ) -> CatalogResult<Vec<CatalogEntry>>;

    /// Insert a short link.
    ///
    /// # Errors
    ///
    /// Returns `UniqueViolation` if the token is taken.
    async fn insert_link(&self, link: ShortLink) -> CatalogResult<ShortLink>;

    /// Fetch a short link by token.
    async fn find_link_by_token(&self, token: &str) -> CatalogResult<Option<ShortLink>>;

    /// List every short link, newest first.
    async fn list_links(&self) -> CatalogResult<Vec<ShortLink>>;

    /// Remove links whose expiry is before `now`. Returns how many were removed.
    async fn delete_expired_links(&self, now: DateTime<Utc>) -> CatalogResult<u64>;

    /// Apply every write of `batch` atomically.
    ///
    /// # Errors
    ///
    /// Returns `PreconditionFailed`, `NotFound` or `UniqueViolation` without
    /// applying any write.
    async fn apply(&self, batch: CatalogBatch) -> CatalogResult<()>;
}
