//! Per-operation tracing context.

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use skydisk_core::DiskError;
use uuid::Uuid;

/// Identifies one drive operation in the logs.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Unique id of this operation.
    pub request_id: Uuid,
    /// Operation name (`upload`, `rename`, ...).
    pub operation: String,
    /// Storage source the operation targets, if known.
    pub source_id: Option<String>,
    /// Entry the operation targets, if known.
    pub entry_id: Option<String>,
    /// Virtual path involved, if any.
    pub path: Option<String>,
    /// Wall-clock start.
    pub started_at: DateTime<Utc>,
    start: Instant,
}

impl RequestContext {
    /// Start a context for `operation`.
    #[must_use]
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            operation: operation.into(),
            source_id: None,
            entry_id: None,
            path: None,
            started_at: Utc::now(),
            start: Instant::now(),
        }
    }

    /// Tag with a storage source.
    #[must_use]
    pub fn with_source(mut self, source_id: impl ToString) -> Self {
        self.source_id = Some(source_id.to_string());
        self
    }

    /// Tag with an entry.
    #[must_use]
    pub fn with_entry(mut self, entry_id: impl ToString) -> Self {
        self.entry_id = Some(entry_id.to_string());
        self
    }

    /// Tag with a virtual path.
    #[must_use]
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Time since the context was created.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// First eight characters of the request id.
    #[must_use]
    pub fn short_id(&self) -> String {
        self.request_id.simple().to_string().chars().take(8).collect()
    }

    /// Log the outcome and duration of the operation.
    ///
    /// Client faults are logged at `debug`, system failures at `warn`.
    pub fn finish<T>(&self, outcome: &Result<T, DiskError>) {
        let elapsed_ms = u64::try_from(self.elapsed().as_millis()).unwrap_or(u64::MAX);
        match outcome {
            Ok(_) => tracing::debug!(elapsed_ms, "operation finished"),
            Err(e) if e.is_client_fault() => {
                tracing::debug!(elapsed_ms, error = %e, "operation rejected");
            },
            Err(e) => tracing::warn!(elapsed_ms, error = %e, "operation failed"),
        }
    }

    /// A span carrying the context's fields.
    #[must_use]
    pub fn span(&self) -> tracing::Span {
        tracing::info_span!(
            "drive",
            request_id = %self.short_id(),
            operation = %self.operation,
            source_id = self.source_id.as_deref(),
            entry_id = self.entry_id.as_deref(),
            path = self.path.as_deref(),
        )
    }
}
