//! SkyDisk Catalog - persistence of sources, entries and short links.
//!
//! The [`CatalogStore`] trait is the only thing higher layers see. It offers
//! equality lookups, the descendant query used by rename and delete cascades,
//! and atomic [`CatalogBatch`] application. [`MemoryCatalog`] implements it in
//! memory with an optional JSON snapshot file.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod batch;
pub mod error;
pub mod memory;
pub mod store;

pub use batch::{CatalogBatch, CatalogWrite};
pub use error::{CatalogError, CatalogResult};
pub use memory::MemoryCatalog;
pub use store::CatalogStore;
