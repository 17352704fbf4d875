#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

//! Layered configuration for SkyDisk.
//!
//! # Usage
//!
//! ```rust,no_run
//! use skydisk_config::Config;
//!
//! let resolved = Config::load(None).unwrap();
//! println!("local root: {}", resolved.config.storage.local.base_path);
//! ```
//!
//! # Precedence
//!
//! From highest to lowest priority:
//!
//! 1. Environment variables (`SKYDISK_*`)
//! 2. The config file (`--config <path>`, or `~/.skydisk/config.toml`)
//! 3. Embedded defaults (`defaults.toml` compiled into the binary)
//!
//! This crate depends on no other SkyDisk crate. Conversion into storage
//! sources happens in `skydisk-drive`.

/// `SKYDISK_*` environment overrides.
pub mod env;
/// Configuration error types.
pub mod error;
/// Configuration file discovery and loading.
pub mod loader;
/// Resolved configuration display.
pub mod show;
/// Configuration struct definitions.
pub mod types;
/// Configuration validation rules.
pub mod validate;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLayer, FieldSources, LoadOptions};
pub use show::{ResolvedConfig, ShowFormat};
pub use types::*;

impl Config {
    /// Load configuration with the full precedence chain.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the config file is malformed or the final
    /// configuration fails validation.
    pub fn load(config_path: Option<&std::path::Path>) -> ConfigResult<ResolvedConfig> {
        loader::load(config_path)
    }

    /// Load configuration from a single file on top of the defaults, ignoring
    /// the environment.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the file cannot be read, parsed, or fails
    /// validation.
    pub fn load_file(path: &std::path::Path) -> ConfigResult<Self> {
        loader::load_file(path)
    }
}
