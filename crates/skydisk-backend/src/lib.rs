//! SkyDisk Backend - physical storage behind the virtual tree.
//!
//! A [`StorageBackend`] turns `(source, directory, filename)` triples into
//! native objects and back. Two implementations ship:
//!
//! - [`LocalBackend`] writes under an absolute root directory
//! - [`ObjectStoreBackend`] writes to an S3-compatible bucket through an
//!   [`ObjectClient`]
//!
//! The [`BackendRegistry`] picks the backend that supports a source. Every
//! backend re-checks confinement of stored locators on its own, independent of
//! the path normalization done upstream.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod backend;
pub mod confine;
pub mod local;
pub mod object;
pub mod registry;

pub use backend::{ByteStream, StorageBackend, byte_stream};
pub use local::LocalBackend;
pub use object::{
    ClientFactory, MemoryObjectClient, ObjectClient, ObjectStoreBackend, ObjectStoreConfig,
    ObjectStoreError, S3Client,
};
pub use registry::BackendRegistry;
