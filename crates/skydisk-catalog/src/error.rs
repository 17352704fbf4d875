//! Catalog error types.

use skydisk_core::DiskError;

/// Errors from catalog operations.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// A write would violate a uniqueness constraint.
    #[error("unique constraint violated: {0}")]
    UniqueViolation(String),

    /// A batch precondition did not hold.
    #[error("precondition failed: {0}")]
    PreconditionFailed(String),

    /// The record to update does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The store failed internally.
    #[error("storage error: {0}")]
    Internal(String),

    /// Snapshot serialization or deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Snapshot file I/O failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for catalog operations.
pub type CatalogResult<T> = Result<T, CatalogError>;

impl From<CatalogError> for DiskError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::UniqueViolation(msg) | CatalogError::PreconditionFailed(msg) => {
                DiskError::Conflict(msg)
            },
            CatalogError::NotFound(msg) => DiskError::NotFound(msg),
            other => DiskError::Catalog(other.to_string()),
        }
    }
}
