//! Backend selection by storage type.

use std::sync::Arc;

use skydisk_core::{DiskError, DiskResult, SourceId, StorageSource};
use tracing::debug;

use crate::backend::StorageBackend;
use crate::local::LocalBackend;
use crate::object::ObjectStoreBackend;

/// Ordered list of backends; the first one that supports a source serves it.
#[derive(Clone, Default)]
pub struct BackendRegistry {
    backends: Vec<Arc<dyn StorageBackend>>,
}

impl std::fmt::Debug for BackendRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kinds: Vec<String> = self.backends.iter().map(|b| b.kind().to_string()).collect();
        f.debug_struct("BackendRegistry")
            .field("backends", &kinds)
            .finish()
    }
}

impl BackendRegistry {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with the local and S3-compatible backends.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new()
            .with_backend(Arc::new(LocalBackend::new()))
            .with_backend(Arc::new(ObjectStoreBackend::new()))
    }

    /// Append a backend.
    #[must_use]
    pub fn with_backend(mut self, backend: Arc<dyn StorageBackend>) -> Self {
        self.register(backend);
        self
    }

    /// Append a backend in place.
    pub fn register(&mut self, backend: Arc<dyn StorageBackend>) {
        debug!(kind = %backend.kind(), "registered storage backend");
        self.backends.push(backend);
    }

    /// The backend serving `source`.
    ///
    /// # Errors
    ///
    /// Returns [`DiskError::Config`] when no registered backend supports the
    /// source's storage type.
    pub fn resolve(&self, source: &StorageSource) -> DiskResult<Arc<dyn StorageBackend>> {
        self.backends
            .iter()
            .find(|b| b.supports(source))
            .cloned()
            .ok_or_else(|| {
                DiskError::Config(format!(
                    "no backend supports storage type '{}' of source '{}'",
                    source.storage_type, source.name
                ))
            })
    }

    /// Drop cached clients for `source_id` in every backend.
    pub fn invalidate(&self, source_id: SourceId) {
        for backend in &self.backends {
            backend.invalidate(source_id);
        }
    }
}
