//! Transactional write batches.

use skydisk_core::{CatalogEntry, EntryId, SourceId};

/// One write inside a [`CatalogBatch`].
#[derive(Debug, Clone)]
pub enum CatalogWrite {
    /// Abort the batch unless no entry other than `except` occupies the slot.
    RequireVacant {
        /// Source to check.
        source: SourceId,
        /// Canonical parent path.
        directory_path: String,
        /// Leaf name.
        filename: String,
        /// Entry allowed to occupy the slot (the one being renamed).
        except: Option<EntryId>,
    },
    /// Replace an existing entry, provided it still sits where it was read.
    UpdateEntry {
        /// The new row.
        entry: CatalogEntry,
        /// Parent path the stored row must still have.
        expected_directory: String,
        /// Leaf name the stored row must still have.
        expected_filename: String,
    },
    /// Remove an entry. Removing an absent entry is a no-op.
    DeleteEntry(EntryId),
    /// Remove every short link that targets the entry.
    DeleteLinksFor(EntryId),
}

/// A group of writes that commits entirely or not at all.
///
/// Preconditions are evaluated against the state at the start of the batch;
/// uniqueness is evaluated against the state the batch would produce. An
/// update whose row has moved since it was read fails the whole batch, so a
/// batch built from stale reads never lands.
#[derive(Debug, Clone, Default)]
pub struct CatalogBatch {
    writes: Vec<CatalogWrite>,
}

impl CatalogBatch {
    /// Create an empty batch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Require the `(source, directory_path, filename)` slot to be free.
    #[must_use]
    pub fn require_vacant(
        mut self,
        source: SourceId,
        directory_path: impl Into<String>,
        filename: impl Into<String>,
        except: Option<EntryId>,
    ) -> Self {
        self.writes.push(CatalogWrite::RequireVacant {
            source,
            directory_path: directory_path.into(),
            filename: filename.into(),
            except,
        });
        self
    }

    /// Replace the entry read as `previous` with `entry`.
    ///
    /// The write only applies while the stored row still has the parent path
    /// and name of `previous`.
    #[must_use]
    pub fn update_entry(mut self, previous: &CatalogEntry, entry: CatalogEntry) -> Self {
        self.writes.push(CatalogWrite::UpdateEntry {
            expected_directory: previous.directory_path.clone(),
            expected_filename: previous.filename.clone(),
            entry,
        });
        self
    }

    /// Remove an entry.
    #[must_use]
    pub fn delete_entry(mut self, id: EntryId) -> Self {
        self.writes.push(CatalogWrite::DeleteEntry(id));
        self
    }

    /// Remove all links targeting an entry.
    #[must_use]
    pub fn delete_links_for(mut self, id: EntryId) -> Self {
        self.writes.push(CatalogWrite::DeleteLinksFor(id));
        self
    }

    /// Number of writes in the batch.
    #[must_use]
    pub fn len(&self) -> usize {
        self.writes.len()
    }

    /// Whether the batch holds no writes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    /// Iterate the writes in submission order.
    pub fn writes(&self) -> impl Iterator<Item = &CatalogWrite> {
        self.writes.iter()
    }
}

impl Extend<CatalogWrite> for CatalogBatch {
    fn extend<T: IntoIterator<Item = CatalogWrite>>(&mut self, iter: T) {
        self.writes.extend(iter);
    }
}
