//! Prelude module - commonly used types for convenient import.
//!
//! Use `use skydisk_core::prelude::*;` to import all essential types.

pub use crate::{CatalogEntry, EntryDraft, ShortLink, StorageSource, StorageType};
pub use crate::{DiskError, DiskResult};
pub use crate::{EntryId, LinkId, SourceId};
pub use crate::path::{normalize_directory, normalize_filename};
