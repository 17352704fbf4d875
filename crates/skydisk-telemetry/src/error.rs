//! Telemetry error types.

use skydisk_core::DiskError;
use thiserror::Error;

/// Errors from logging setup.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The log level or a directive did not parse.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// A global subscriber was already installed.
    #[error("Initialization error: {0}")]
    InitError(String),

    /// The log directory could not be prepared.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;

impl From<TelemetryError> for DiskError {
    fn from(err: TelemetryError) -> Self {
        DiskError::Config(err.to_string())
    }
}
