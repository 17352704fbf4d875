//! In-memory catalog, optionally mirrored to a JSON snapshot file.

use std::collections::{HashMap, HashSet};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use skydisk_core::path::is_same_or_descendant;
use skydisk_core::{CatalogEntry, EntryId, LinkId, ShortLink, SourceId, StorageSource};
use tracing::{debug, warn};

use crate::batch::{CatalogBatch, CatalogWrite};
use crate::error::{CatalogError, CatalogResult};
use crate::store::CatalogStore;

#[derive(Debug, Default, Clone)]
struct CatalogState {
    sources: HashMap<SourceId, StorageSource>,
    entries: HashMap<EntryId, CatalogEntry>,
    links: HashMap<LinkId, ShortLink>,
}

/// On-disk layout of a catalog snapshot.
#[derive(Debug, Default, Serialize, Deserialize)]
struct Snapshot {
    sources: Vec<StorageSource>,
    entries: Vec<CatalogEntry>,
    links: Vec<ShortLink>,
}

impl CatalogState {
    fn from_snapshot(snapshot: Snapshot) -> Self {
        Self {
            sources: snapshot.sources.into_iter().map(|s| (s.id, s)).collect(),
            entries: snapshot.entries.into_iter().map(|e| (e.id, e)).collect(),
            links: snapshot.links.into_iter().map(|l| (l.id, l)).collect(),
        }
    }

    fn to_snapshot(&self) -> Snapshot {
        Snapshot {
            sources: self.sources.values().cloned().collect(),
            entries: self.entries.values().cloned().collect(),
            links: self.links.values().cloned().collect(),
        }
    }

    fn directory_holder(
        &self,
        source: SourceId,
        parent: &str,
        name: &str,
    ) -> Option<&CatalogEntry> {
        self.entries.values().find(|e| {
            e.is_directory
                && e.storage_source_id == source
                && e.directory_path == parent
                && e.filename == name
        })
    }

    fn occupant(&self, source: SourceId, directory: &str, name: &str) -> Option<&CatalogEntry> {
        self.entries.values().find(|e| {
            e.storage_source_id == source && e.directory_path == directory && e.filename == name
        })
    }

    /// Check a batch without mutating anything.
    fn validate(&self, batch: &CatalogBatch) -> CatalogResult<()> {
        let mut touched: HashSet<EntryId> = HashSet::new();
        let mut updated: Vec<&CatalogEntry> = Vec::new();

        for write in batch.writes() {
            match write {
                CatalogWrite::RequireVacant {
                    source,
                    directory_path,
                    filename,
                    except,
                } => {
                    let blocked = self.entries.values().any(|e| {
                        Some(e.id) != *except
                            && e.storage_source_id == *source
                            && e.directory_path == *directory_path
                            && e.filename == *filename
                    });
                    if blocked {
                        return Err(CatalogError::PreconditionFailed(format!(
                            "'{}' is already occupied",
                            skydisk_core::path::join(directory_path, filename)
                        )));
                    }
                },
                CatalogWrite::UpdateEntry {
                    entry,
                    expected_directory,
                    expected_filename,
                } => {
                    let Some(current) = self.entries.get(&entry.id) else {
                        return Err(CatalogError::NotFound(format!("entry {}", entry.id)));
                    };
                    if current.directory_path != *expected_directory
                        || current.filename != *expected_filename
                    {
                        return Err(CatalogError::PreconditionFailed(format!(
                            "entry {} moved to '{}' after it was read",
                            entry.id,
                            current.full_path()
                        )));
                    }
                    touched.insert(entry.id);
                    updated.push(entry);
                },
                CatalogWrite::DeleteEntry(id) => {
                    touched.insert(*id);
                },
                CatalogWrite::DeleteLinksFor(_) => {},
            }
        }

        // Directory uniqueness in the state the batch would produce.
        let mut claimed: HashSet<(SourceId, &str, &str)> = HashSet::new();
        for entry in updated.iter().filter(|e| e.is_directory) {
            let key = (
                entry.storage_source_id,
                entry.directory_path.as_str(),
                entry.filename.as_str(),
            );
            if !claimed.insert(key) {
                return Err(duplicate_directory(entry));
            }
            if let Some(holder) =
                self.directory_holder(entry.storage_source_id, &entry.directory_path, &entry.filename)
            {
                if !touched.contains(&holder.id) {
                    return Err(duplicate_directory(entry));
                }
            }
        }
        Ok(())
    }

    fn commit(&mut self, batch: CatalogBatch) {
        for write in batch.writes() {
            match write {
                CatalogWrite::RequireVacant { .. } => {},
                CatalogWrite::UpdateEntry { entry, .. } => {
                    self.entries.insert(entry.id, entry.clone());
                },
                CatalogWrite::DeleteEntry(id) => {
                    self.entries.remove(id);
                },
                CatalogWrite::DeleteLinksFor(id) => {
                    self.links.retain(|_, link| link.file_item_id != *id);
                },
            }
        }
    }
}

fn duplicate_directory(entry: &CatalogEntry) -> CatalogError {
    CatalogError::UniqueViolation(format!("directory '{}' already exists", entry.full_path()))
}

fn newest_first(a: &CatalogEntry, b: &CatalogEntry) -> std::cmp::Ordering {
    b.created_at
        .cmp(&a.created_at)
        .then_with(|| a.filename.cmp(&b.filename))
}

fn count(n: usize) -> u64 {
    u64::try_from(n).unwrap_or(u64::MAX)
}

/// In-memory catalog store.
///
/// Thread-safe via an internal [`RwLock`]; every batch is validated and
/// committed under a single write lock, which makes it atomic with respect
/// to readers. When opened with [`MemoryCatalog::open`], every write is
/// staged on a copy of the state and only becomes visible once that copy has
/// been written to the JSON snapshot file. A failed snapshot leaves the
/// catalog as it was.
#[derive(Debug, Default)]
pub struct MemoryCatalog {
    state: RwLock<CatalogState>,
    snapshot_path: Option<PathBuf>,
}

impl MemoryCatalog {
    /// Create an empty, purely in-memory catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a catalog mirrored to `path`, loading it if the file exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn open(path: impl AsRef<Path>) -> CatalogResult<Self> {
        let path = path.as_ref().to_path_buf();
        let state = if path.exists() {
            let raw = std::fs::read(&path)?;
            let snapshot: Snapshot = serde_json::from_slice(&raw)
                .map_err(|e| CatalogError::Serialization(e.to_string()))?;
            debug!(
                path = %path.display(),
                entries = snapshot.entries.len(),
                "loaded catalog snapshot"
            );
            CatalogState::from_snapshot(snapshot)
        } else {
            CatalogState::default()
        };
        Ok(Self {
            state: RwLock::new(state),
            snapshot_path: Some(path),
        })
    }

    fn read(&self) -> CatalogResult<RwLockReadGuard<'_, CatalogState>> {
        self.state
            .read()
            .map_err(|e| CatalogError::Internal(e.to_string()))
    }

    fn write(&self) -> CatalogResult<RwLockWriteGuard<'_, CatalogState>> {
        self.state
            .write()
            .map_err(|e| CatalogError::Internal(e.to_string()))
    }

    /// Apply a validated `change` to the locked `state`.
    ///
    /// With a snapshot file the change runs on a copy that replaces `state`
    /// only after it has been persisted.
    fn stage<T>(
        &self,
        state: &mut CatalogState,
        change: impl FnOnce(&mut CatalogState) -> T,
    ) -> CatalogResult<T> {
        if self.snapshot_path.is_none() {
            return Ok(change(state));
        }
        let mut candidate = state.clone();
        let out = change(&mut candidate);
        self.persist(&candidate)?;
        *state = candidate;
        Ok(out)
    }

    /// Write the snapshot while the caller still holds the write lock, so
    /// snapshots land in commit order.
    fn persist(&self, state: &CatalogState) -> CatalogResult<()> {
        let Some(path) = &self.snapshot_path else {
            return Ok(());
        };
        let bytes = serde_json::to_vec_pretty(&state.to_snapshot())
            .map_err(|e| CatalogError::Serialization(e.to_string()))?;
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(dir)?;
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(&bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|e| {
            warn!(path = %path.display(), error = %e, "failed to persist catalog snapshot");
            CatalogError::Io(e.error)
        })?;
        Ok(())
    }
}

#[async_trait]
impl CatalogStore for MemoryCatalog {
    async fn insert_source(&self, source: StorageSource) -> CatalogResult<StorageSource> {
        let mut state = self.write()?;
        if state.sources.values().any(|s| s.name == source.name) {
            return Err(CatalogError::UniqueViolation(format!(
                "storage source '{}' already exists",
                source.name
            )));
        }
        self.stage(&mut state, |s| {
            s.sources.insert(source.id, source.clone());
        })?;
        Ok(source)
    }

    async fn update_source(&self, source: StorageSource) -> CatalogResult<StorageSource> {
        let mut state = self.write()?;
        if !state.sources.contains_key(&source.id) {
            return Err(CatalogError::NotFound(format!("storage source {}", source.id)));
        }
        if state
            .sources
            .values()
            .any(|s| s.id != source.id && s.name == source.name)
        {
            return Err(CatalogError::UniqueViolation(format!(
                "storage source '{}' already exists",
                source.name
            )));
        }
        self.stage(&mut state, |s| {
            s.sources.insert(source.id, source.clone());
        })?;
        Ok(source)
    }

    async fn delete_source(&self, id: SourceId) -> CatalogResult<bool> {
        let mut state = self.write()?;
        if state.entries.values().any(|e| e.storage_source_id == id) {
            return Err(CatalogError::PreconditionFailed(format!(
                "storage source {id} is still referenced by catalog entries"
            )));
        }
        if !state.sources.contains_key(&id) {
            return Ok(false);
        }
        self.stage(&mut state, |s| {
            s.sources.remove(&id);
        })?;
        Ok(true)
    }

    async fn get_source(&self, id: SourceId) -> CatalogResult<Option<StorageSource>> {
        Ok(self.read()?.sources.get(&id).cloned())
    }

    async fn find_source_by_name(&self, name: &str) -> CatalogResult<Option<StorageSource>> {
        Ok(self
            .read()?
            .sources
            .values()
            .find(|s| s.name == name)
            .cloned())
    }

    async fn list_sources(&self) -> CatalogResult<Vec<StorageSource>> {
        let mut sources: Vec<StorageSource> = self.read()?.sources.values().cloned().collect();
        sources.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(sources)
    }

    async fn insert_entry(&self, entry: CatalogEntry) -> CatalogResult<CatalogEntry> {
        let mut state = self.write()?;
        if state.entries.contains_key(&entry.id) {
            return Err(CatalogError::UniqueViolation(format!("entry {}", entry.id)));
        }
        if entry.is_directory
            && state
                .directory_holder(entry.storage_source_id, &entry.directory_path, &entry.filename)
                .is_some()
        {
            return Err(duplicate_directory(&entry));
        }
        self.stage(&mut state, |s| {
            s.entries.insert(entry.id, entry.clone());
        })?;
        Ok(entry)
    }

    async fn get_entry(&self, id: EntryId) -> CatalogResult<Option<CatalogEntry>> {
        Ok(self.read()?.entries.get(&id).cloned())
    }

    async fn find_directory(
        &self,
        source: SourceId,
        parent: &str,
        name: &str,
    ) -> CatalogResult<Option<CatalogEntry>> {
        Ok(self.read()?.directory_holder(source, parent, name).cloned())
    }

    async fn name_exists(
        &self,
        source: SourceId,
        directory: &str,
        name: &str,
    ) -> CatalogResult<bool> {
        Ok(self.read()?.occupant(source, directory, name).is_some())
    }

    async fn list_directory(
        &self,
        source: SourceId,
        directory: &str,
    ) -> CatalogResult<Vec<CatalogEntry>> {
        let mut entries: Vec<CatalogEntry> = self
            .read()?
            .entries
            .values()
            .filter(|e| e.storage_source_id == source && e.directory_path == directory)
            .cloned()
            .collect();
        entries.sort_by(|a, b| {
            b.is_directory
                .cmp(&a.is_directory)
                .then_with(|| newest_first(a, b))
        });
        Ok(entries)
    }

    async fn list_entries(&self, source: Option<SourceId>) -> CatalogResult<Vec<CatalogEntry>> {
        let mut entries: Vec<CatalogEntry> = self
            .read()?
            .entries
            .values()
            .filter(|e| source.is_none_or(|s| e.storage_source_id == s))
            .cloned()
            .collect();
        entries.sort_by(newest_first);
        Ok(entries)
    }

    async fn find_descendants(
        &self,
        source: SourceId,
        full_path: &str,
    ) -> CatalogResult<Vec<CatalogEntry>> {
        let mut entries: Vec<CatalogEntry> = self
            .read()?
            .entries
            .values()
            .filter(|e| {
                e.storage_source_id == source && is_same_or_descendant(&e.directory_path, full_path)
            })
            .cloned()
            .collect();
        // Deepest first, so a cascade removes children before parents.
        entries.sort_by(|a, b| b.directory_path.len().cmp(&a.directory_path.len()));
        Ok(entries)
    }

    async fn insert_link(&self, link: ShortLink) -> CatalogResult<ShortLink> {
        let mut state = self.write()?;
        if state.links.values().any(|l| l.token == link.token) {
            return Err(CatalogError::UniqueViolation(format!(
                "link token '{}' already exists",
                link.token
            )));
        }
        self.stage(&mut state, |s| {
            s.links.insert(link.id, link.clone());
        })?;
        Ok(link)
    }

    async fn find_link_by_token(&self, token: &str) -> CatalogResult<Option<ShortLink>> {
        Ok(self
            .read()?
            .links
            .values()
            .find(|l| l.token == token)
            .cloned())
    }

    async fn list_links(&self) -> CatalogResult<Vec<ShortLink>> {
        let mut links: Vec<ShortLink> = self.read()?.links.values().cloned().collect();
        links.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(links)
    }

    async fn delete_expired_links(&self, now: DateTime<Utc>) -> CatalogResult<u64> {
        let mut state = self.write()?;
        let removed = state
            .links
            .values()
            .filter(|link| link.is_expired_at(now))
            .count();
        if removed > 0 {
            self.stage(&mut state, |s| {
                s.links.retain(|_, link| !link.is_expired_at(now));
            })?;
        }
        Ok(count(removed))
    }

    async fn apply(&self, batch: CatalogBatch) -> CatalogResult<()> {
        if batch.is_empty() {
            return Ok(());
        }
        let mut state = self.write()?;
        state.validate(&batch)?;
        self.stage(&mut state, |s| s.commit(batch))
    }
}
