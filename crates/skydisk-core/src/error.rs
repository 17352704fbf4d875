//! Error taxonomy shared by every SkyDisk crate.

use thiserror::Error;

/// Boxed error used to carry an underlying I/O or network cause.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors surfaced by storage, tree and link operations.
///
/// Path, name, conflict and lookup failures are client faults and are always
/// reported as distinct variants. Only [`DiskError::Io`] is worth retrying.
#[derive(Debug, Error)]
pub enum DiskError {
    /// Directory path is malformed or escapes its root.
    #[error("invalid path: {0}")]
    InvalidPath(String),

    /// Leaf file name is malformed.
    #[error("invalid filename: {0}")]
    InvalidFilename(String),

    /// Destination is already occupied.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Source, entry or link does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The short link exists but its expiry has passed.
    #[error("link expired: {token}")]
    Expired {
        /// Token of the expired link.
        token: String,
    },

    /// The short link requires an access code that was missing or wrong.
    #[error("access denied for link {token}")]
    AccessDenied {
        /// Token of the protected link.
        token: String,
    },

    /// Operation is not valid for this kind of entry (e.g. linking a directory).
    #[error("invalid target: {0}")]
    InvalidTarget(String),

    /// A request parameter is outside its accepted range.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Backend configuration is malformed or incomplete.
    #[error("configuration error: {0}")]
    Config(String),

    /// Backend I/O failed.
    #[error("{op} failed for source {source_id} at '{path}': {cause}")]
    Io {
        /// Operation that failed (`store`, `load`, ...).
        op: &'static str,
        /// Storage source the operation ran against.
        source_id: String,
        /// Virtual or native path involved.
        path: String,
        /// Underlying cause.
        #[source]
        cause: BoxError,
    },

    /// The catalog store rejected or failed a write.
    #[error("catalog error: {0}")]
    Catalog(String),
}

impl DiskError {
    /// Wrap a backend failure with its diagnostic context.
    pub fn io(
        op: &'static str,
        source_id: impl ToString,
        path: impl Into<String>,
        cause: impl Into<BoxError>,
    ) -> Self {
        Self::Io {
            op,
            source_id: source_id.to_string(),
            path: path.into(),
            cause: cause.into(),
        }
    }

    /// Whether repeating an idempotent operation might succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Io { .. })
    }

    /// Whether the error was caused by caller input rather than the system.
    #[must_use]
    pub fn is_client_fault(&self) -> bool {
        matches!(
            self,
            Self::InvalidPath(_)
                | Self::InvalidFilename(_)
                | Self::Conflict(_)
                | Self::NotFound(_)
                | Self::Expired { .. }
                | Self::AccessDenied { .. }
                | Self::InvalidTarget(_)
                | Self::InvalidArgument(_)
        )
    }
}

/// Result type for SkyDisk operations.
pub type DiskResult<T> = Result<T, DiskError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_carries_context() {
        let err = DiskError::io(
            "load",
            "src-1",
            "docs/a.txt",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        let msg = err.to_string();
        assert!(msg.contains("load"));
        assert!(msg.contains("src-1"));
        assert!(msg.contains("docs/a.txt"));
        assert!(err.is_retryable());
        assert!(!err.is_client_fault());
    }

    #[test]
    fn test_client_faults_are_not_retryable() {
        let err = DiskError::InvalidPath("../etc".into());
        assert!(err.is_client_fault());
        assert!(!err.is_retryable());
        assert!(DiskError::InvalidArgument("ttl".into()).is_client_fault());
    }
}
