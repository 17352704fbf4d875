//! The backend contract.

use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use skydisk_core::{CatalogEntry, DiskResult, EntryDraft, SourceId, StorageSource, StorageType};
use tokio::io::AsyncRead;

/// A readable stream of file content.
pub type ByteStream = Pin<Box<dyn AsyncRead + Send>>;

/// Wrap an in-memory buffer as a [`ByteStream`].
#[must_use]
pub fn byte_stream(bytes: impl Into<Vec<u8>>) -> ByteStream {
    Box::pin(std::io::Cursor::new(bytes.into()))
}

/// Physical storage for one kind of [`StorageSource`].
///
/// Implementations receive canonical directory paths and leaf names. They
/// must still confine every native locator they resolve to the source's root
/// and reject anything else with [`DiskError::InvalidPath`].
///
/// [`DiskError::InvalidPath`]: skydisk_core::DiskError::InvalidPath
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// The storage type this backend serves.
    fn kind(&self) -> StorageType;

    /// Whether this backend can serve `source`.
    fn supports(&self, source: &StorageSource) -> bool {
        source.storage_type == self.kind()
    }

    /// Make sure `directory` exists physically. Idempotent.
    async fn ensure_directory(&self, source: &StorageSource, directory: &str) -> DiskResult<()>;

    /// Write `reader` as `filename` under `directory`.
    ///
    /// `size` is the length announced by the caller, if any; the draft
    /// carries the number of bytes actually written.
    async fn store(
        &self,
        source: &StorageSource,
        directory: &str,
        filename: &str,
        content_type: Option<&str>,
        size: Option<u64>,
        reader: ByteStream,
    ) -> DiskResult<EntryDraft>;

    /// Open the physical object behind `entry`.
    async fn load(&self, source: &StorageSource, entry: &CatalogEntry) -> DiskResult<ByteStream>;

    /// Remove the physical object behind `entry`. A missing object is not an
    /// error.
    async fn delete(&self, source: &StorageSource, entry: &CatalogEntry) -> DiskResult<()>;

    /// A time-limited URL granting direct read access, when the backend can
    /// mint one.
    async fn presigned_url(
        &self,
        _source: &StorageSource,
        _entry: &CatalogEntry,
        _ttl: Option<Duration>,
    ) -> DiskResult<Option<String>> {
        Ok(None)
    }

    /// Drop any cached state derived from the source's configuration.
    fn invalidate(&self, _source_id: SourceId) {}
}
