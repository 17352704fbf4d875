//! SkyDisk Core - domain model shared by every SkyDisk crate.
//!
//! This crate provides:
//! - Identifier newtypes for sources, entries and links
//! - The [`StorageSource`], [`CatalogEntry`] and [`ShortLink`] records
//! - The [`DiskError`] taxonomy used across crate boundaries
//! - Path canonicalization ([`path`]), the first line of traversal defense

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

pub mod entry;
pub mod error;
pub mod ids;
pub mod link;
pub mod path;
pub mod source;

pub use entry::{CatalogEntry, DEFAULT_CONTENT_TYPE, DIRECTORY_CONTENT_TYPE, EntryDraft};
pub use error::{BoxError, DiskError, DiskResult};
pub use ids::{EntryId, LinkId, SourceId};
pub use link::ShortLink;
pub use source::{StorageSource, StorageType};
