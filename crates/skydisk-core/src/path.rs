//! Virtual path canonicalization.
//!
//! Every directory path and leaf name that enters the system goes through
//! [`normalize_directory`] or [`normalize_filename`] first. Canonical
//! directory paths use `/` as the only separator, never start or end with
//! `/`, and the empty string denotes the root. Backends add their own
//! confinement check on top of this; the two layers are independent.

use crate::error::{DiskError, DiskResult};

/// Characters that are never allowed inside a path segment.
pub const FORBIDDEN_CHARS: &[char] = &['<', '>', ':', '"', '|', '?', '*'];

/// Canonicalize a user-supplied directory path.
///
/// Blank input is the root (`""`). Leading whitespace is dropped; trailing
/// whitespace is kept so the segment check rejects it. Backslashes become
/// forward slashes, repeated separators collapse, and one leading and
/// trailing separator is stripped.
///
/// # Errors
///
/// Returns [`DiskError::InvalidPath`] for `..` traversal, empty segments,
/// segments ending in a space or dot, and segments containing a forbidden
/// or control character.
pub fn normalize_directory(raw: &str) -> DiskResult<String> {
    let trimmed = raw.trim_start();
    if trimmed.is_empty() {
        return Ok(String::new());
    }

    let mut cleaned = String::with_capacity(trimmed.len());
    let mut last_was_sep = false;
    for ch in trimmed.chars() {
        let ch = if ch == '\\' { '/' } else { ch };
        if ch == '/' {
            if last_was_sep {
                continue;
            }
            last_was_sep = true;
        } else {
            last_was_sep = false;
        }
        cleaned.push(ch);
    }

    let cleaned = cleaned.strip_prefix('/').unwrap_or(&cleaned);
    let cleaned = cleaned.strip_suffix('/').unwrap_or(cleaned);
    if cleaned.is_empty() {
        return Ok(String::new());
    }

    if cleaned == ".." || cleaned.contains("../") {
        return Err(DiskError::InvalidPath(format!(
            "'{raw}' traverses outside its root"
        )));
    }

    for segment in cleaned.split('/') {
        check_segment(segment).map_err(|reason| {
            DiskError::InvalidPath(format!("'{raw}': segment '{segment}' {reason}"))
        })?;
    }

    Ok(cleaned.to_owned())
}

/// Canonicalize a user-supplied leaf name.
///
/// # Errors
///
/// Returns [`DiskError::InvalidFilename`] for blank names, `.`/`..`, names
/// containing a separator, names ending in a space or dot, and names
/// containing a forbidden or control character.
pub fn normalize_filename(raw: &str) -> DiskResult<String> {
    let cleaned = raw.trim_start();
    if cleaned.is_empty() {
        return Err(DiskError::InvalidFilename("filename cannot be blank".into()));
    }
    if cleaned == "." || cleaned == ".." {
        return Err(DiskError::InvalidFilename(format!("'{cleaned}' is reserved")));
    }
    if cleaned.contains(['/', '\\']) {
        return Err(DiskError::InvalidFilename(format!(
            "'{cleaned}' contains a path separator"
        )));
    }
    check_segment(cleaned)
        .map_err(|reason| DiskError::InvalidFilename(format!("'{cleaned}' {reason}")))?;
    Ok(cleaned.to_owned())
}

fn check_segment(segment: &str) -> Result<(), &'static str> {
    if segment.is_empty() {
        return Err("is empty");
    }
    if segment.ends_with(' ') || segment.ends_with('.') {
        return Err("ends with a space or dot");
    }
    if segment.contains(FORBIDDEN_CHARS) {
        return Err("contains a forbidden character");
    }
    if segment.chars().any(char::is_control) {
        return Err("contains a control character");
    }
    Ok(())
}

/// Join a canonical directory path and a leaf name.
#[must_use]
pub fn join(directory: &str, name: &str) -> String {
    if directory.is_empty() {
        name.to_owned()
    } else {
        format!("{directory}/{name}")
    }
}

/// Parent of a canonical path (`""` for top-level entries).
#[must_use]
pub fn parent_of(path: &str) -> &str {
    path.rsplit_once('/').map_or("", |(parent, _)| parent)
}

/// Last segment of a canonical path.
#[must_use]
pub fn leaf_of(path: &str) -> &str {
    path.rsplit_once('/').map_or(path, |(_, leaf)| leaf)
}

/// Whether `path` is `ancestor` itself or lies underneath it.
///
/// Matches on segment boundaries only, so `docs2` is not inside `docs`.
#[must_use]
pub fn is_same_or_descendant(path: &str, ancestor: &str) -> bool {
    match path.strip_prefix(ancestor) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

/// Replace the `old_prefix` of `path` with `new_prefix`.
///
/// Returns `None` when `path` is not `old_prefix` or one of its descendants.
#[must_use]
pub fn rebase(path: &str, old_prefix: &str, new_prefix: &str) -> Option<String> {
    if !is_same_or_descendant(path, old_prefix) {
        return None;
    }
    let rest = path.strip_prefix(old_prefix)?;
    Some(format!("{new_prefix}{rest}"))
}

/// Iterate `(parent, segment)` pairs from the root down to the leaf.
pub fn ancestry(path: &str) -> impl Iterator<Item = (String, &str)> {
    let mut parent = String::new();
    path.split('/').filter(|s| !s.is_empty()).map(move |segment| {
        let current_parent = parent.clone();
        parent = join(&parent, segment);
        (current_parent, segment)
    })
}
