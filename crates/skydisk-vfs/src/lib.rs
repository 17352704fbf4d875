//! SkyDisk VFS - a hierarchical namespace kept in a flat catalog.
//!
//! Each entry records its canonical parent path and leaf name. The
//! [`DirectoryTree`] keeps that representation consistent:
//!
//! - every ancestor of an entry exists as a directory entry
//! - renaming a directory rewrites the parent path of all its descendants
//!   in one atomic batch
//! - deleting a directory removes its links, its physical objects and its
//!   rows, in that order
//!
//! Physical objects are never moved by a rename.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

mod tree;

pub use tree::DirectoryTree;
