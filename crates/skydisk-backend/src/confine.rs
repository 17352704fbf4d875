//! Lexical confinement of native locators.
//!
//! Stored `storage_path` values are re-validated before every load and
//! delete, even though they were produced by the backend itself. None of
//! these checks touch the filesystem.

use std::path::{Component, Path, PathBuf};

use skydisk_core::{DiskError, DiskResult};

/// Resolve `relative` underneath `root`.
///
/// # Errors
///
/// Returns [`DiskError::InvalidPath`] when `relative` is empty, absolute, or
/// contains a `..` component.
pub fn resolve_within(root: &Path, relative: &str) -> DiskResult<PathBuf> {
    if relative.trim().is_empty() {
        return Err(DiskError::InvalidPath("empty storage path".into()));
    }
    let mut resolved = root.to_path_buf();
    for component in Path::new(relative).components() {
        match component {
            Component::Normal(part) => resolved.push(part),
            Component::CurDir => {},
            Component::ParentDir => {
                return Err(DiskError::InvalidPath(format!(
                    "'{relative}' escapes the storage root"
                )));
            },
            Component::Prefix(_) | Component::RootDir => {
                return Err(DiskError::InvalidPath(format!(
                    "'{relative}' is not relative to the storage root"
                )));
            },
        }
    }
    if resolved == root {
        return Err(DiskError::InvalidPath(format!(
            "'{relative}' does not name an object"
        )));
    }
    Ok(resolved)
}

/// Check that an object key lives under `prefix` and has no `..` segment.
///
/// # Errors
///
/// Returns [`DiskError::InvalidPath`] when the key is empty, absolute,
/// contains a `..` segment, or falls outside `prefix`.
pub fn check_object_key(prefix: &str, key: &str) -> DiskResult<()> {
    if key.is_empty() || key.starts_with('/') {
        return Err(DiskError::InvalidPath(format!("malformed object key '{key}'")));
    }
    if key.split('/').any(|segment| segment == "..") {
        return Err(DiskError::InvalidPath(format!(
            "object key '{key}' escapes its prefix"
        )));
    }
    if !prefix.is_empty() {
        let inside = key
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.starts_with('/') && rest.len() > 1);
        if !inside {
            return Err(DiskError::InvalidPath(format!(
                "object key '{key}' is outside prefix '{prefix}'"
            )));
        }
    }
    Ok(())
}
