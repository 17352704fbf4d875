//! SkyDisk Telemetry - logging and per-operation tracing context.
//!
//! This crate provides:
//! - [`LogConfig`] and [`setup_logging`] for installing a `tracing` subscriber
//!   writing pretty, compact, full or JSON output to stdout, stderr or a
//!   rolling file
//! - [`RequestContext`] for tagging every drive operation with a request id
//!   and logging its outcome and duration
//!
//! # Example
//!
//! ```rust,no_run
//! use skydisk_telemetry::{LogConfig, LogFormat, RequestContext, setup_logging};
//!
//! # fn main() -> Result<(), skydisk_telemetry::TelemetryError> {
//! setup_logging(&LogConfig::new("info").with_format(LogFormat::Compact))?;
//!
//! let ctx = RequestContext::new("browse").with_path("docs");
//! let _entered = ctx.span().entered();
//! tracing::info!("listing directory");
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod context;
mod error;
mod logging;

pub use context::RequestContext;
pub use error::{TelemetryError, TelemetryResult};
pub use logging::{FileRotation, LogConfig, LogFormat, LogTarget, setup_default_logging, setup_logging};
