//! Catalog entries: the flat records that make up the virtual tree.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{EntryId, SourceId};
use crate::path;

/// Content type recorded on directory entries.
pub const DIRECTORY_CONTENT_TYPE: &str = "inode/directory";

/// Content type used when an entry has none recorded.
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// A persisted file or directory record.
///
/// The full virtual path is `directory_path/filename`. Directories carry no
/// physical object, so their `storage_path` is empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Record identity.
    pub id: EntryId,
    /// Owning storage source.
    pub storage_source_id: SourceId,
    /// Leaf name, never containing a separator.
    pub filename: String,
    /// Canonical parent path, `""` for the root.
    pub directory_path: String,
    /// Backend-native locator of the physical object.
    pub storage_path: String,
    /// Size in bytes.
    pub size: u64,
    /// MIME type as supplied at upload.
    pub content_type: Option<String>,
    /// Whether this record is a directory.
    pub is_directory: bool,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl CatalogEntry {
    /// Build a directory record named `name` under `parent`.
    #[must_use]
    pub fn directory(source: SourceId, parent: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: EntryId::new(),
            storage_source_id: source,
            filename: name.into(),
            directory_path: parent.into(),
            storage_path: String::new(),
            size: 0,
            content_type: Some(DIRECTORY_CONTENT_TYPE.to_owned()),
            is_directory: true,
            created_at: Utc::now(),
        }
    }

    /// Turn a backend draft into a record with a fresh id and timestamp.
    #[must_use]
    pub fn from_draft(draft: EntryDraft) -> Self {
        Self {
            id: EntryId::new(),
            storage_source_id: draft.storage_source_id,
            filename: draft.filename,
            directory_path: draft.directory_path,
            storage_path: draft.storage_path,
            size: draft.size,
            content_type: draft.content_type,
            is_directory: false,
            created_at: Utc::now(),
        }
    }

    /// Full virtual path of this entry.
    #[must_use]
    pub fn full_path(&self) -> String {
        path::join(&self.directory_path, &self.filename)
    }

    /// Content type to serve, falling back to [`DEFAULT_CONTENT_TYPE`].
    #[must_use]
    pub fn effective_content_type(&self) -> &str {
        self.content_type
            .as_deref()
            .map(str::trim)
            .filter(|ct| !ct.is_empty())
            .unwrap_or(DEFAULT_CONTENT_TYPE)
    }
}

/// What a backend reports after writing a file, before it is cataloged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryDraft {
    /// Owning storage source.
    pub storage_source_id: SourceId,
    /// Leaf name.
    pub filename: String,
    /// Canonical parent path.
    pub directory_path: String,
    /// Backend-native locator.
    pub storage_path: String,
    /// Bytes written.
    pub size: u64,
    /// MIME type.
    pub content_type: Option<String>,
}
