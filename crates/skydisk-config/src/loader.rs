//! Config file discovery and layered loading.
//!
//! 1. Parse the embedded `defaults.toml`
//! 2. Merge the config file: an explicit path, or `~/.skydisk/config.toml`
//!    when it exists
//! 3. Apply `SKYDISK_*` environment overrides
//! 4. Deserialize and validate

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::env::{apply_env_overrides, collect_env_vars};
use crate::error::{ConfigError, ConfigResult};
use crate::show::ResolvedConfig;
use crate::types::Config;
use crate::validate;

const DEFAULTS_TOML: &str = include_str!("defaults.toml");

/// Config files larger than this are rejected.
const MAX_CONFIG_FILE_SIZE: u64 = 1024 * 1024;

/// Where a resolved value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigLayer {
    /// Embedded defaults.
    Defaults,
    /// The config file.
    File,
    /// A `SKYDISK_*` variable.
    Env,
}

impl fmt::Display for ConfigLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Defaults => write!(f, "defaults"),
            Self::File => write!(f, "file"),
            Self::Env => write!(f, "env"),
        }
    }
}

/// Dotted field path to the layer that set it.
pub type FieldSources = BTreeMap<String, ConfigLayer>;

/// Options for [`load_with`].
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Explicit config file. Must exist when given.
    pub config_path: Option<PathBuf>,
    /// Home directory used to find `~/.skydisk/config.toml`.
    pub home_dir: Option<PathBuf>,
    /// Environment to read overrides from instead of the process.
    pub env: Option<HashMap<String, String>>,
}

/// Load configuration from the usual places.
///
/// # Errors
///
/// Returns a [`ConfigError`] if a file is unreadable or malformed, an
/// override does not parse, or the result fails validation.
pub fn load(config_path: Option<&Path>) -> ConfigResult<ResolvedConfig> {
    load_with(LoadOptions {
        config_path: config_path.map(Path::to_path_buf),
        ..LoadOptions::default()
    })
}

/// Load configuration with explicit discovery inputs.
///
/// # Errors
///
/// See [`load`].
pub fn load_with(options: LoadOptions) -> ConfigResult<ResolvedConfig> {
    let mut merged: toml::Value =
        toml::from_str(DEFAULTS_TOML).map_err(|e| ConfigError::ParseError {
            path: "<embedded defaults>".to_owned(),
            source: e,
        })?;
    let mut field_sources = FieldSources::new();
    record_layer(&merged, "", ConfigLayer::Defaults, &mut field_sources);
    let mut loaded_files = Vec::new();

    let file = match &options.config_path {
        Some(path) => Some((read_file(path)?, path.clone())),
        None => {
            let home = match options.home_dir {
                Some(ref home) => home.clone(),
                None => home_directory()?,
            };
            let path = home.join(".skydisk").join("config.toml");
            try_load_file(&path)?.map(|overlay| (overlay, path))
        },
    };
    if let Some((overlay, path)) = file {
        record_layer(&overlay, "", ConfigLayer::File, &mut field_sources);
        deep_merge(&mut merged, &overlay);
        info!(path = %path.display(), "loaded config file");
        loaded_files.push(path.display().to_string());
    }

    let env = options.env.unwrap_or_else(collect_env_vars);
    let env_overrides = apply_env_overrides(&mut merged, &env, &mut field_sources)?;

    let config: Config = merged.try_into().map_err(|e| ConfigError::ParseError {
        path: loaded_files
            .last()
            .cloned()
            .unwrap_or_else(|| "<merged config>".to_owned()),
        source: e,
    })?;
    validate::validate(&config)?;

    Ok(ResolvedConfig {
        config,
        field_sources,
        loaded_files,
        env_overrides,
    })
}

/// Load a single file on top of the defaults, without environment overrides.
///
/// # Errors
///
/// Returns a [`ConfigError`] if the file cannot be read, parsed, or fails
/// validation.
pub fn load_file(path: &Path) -> ConfigResult<Config> {
    load_with(LoadOptions {
        config_path: Some(path.to_path_buf()),
        home_dir: None,
        env: Some(HashMap::new()),
    })
    .map(|resolved| resolved.config)
}

fn read_file(path: &Path) -> ConfigResult<toml::Value> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.display().to_string(),
        source: e,
    })?;
    parse_file(path, &content)
}

fn try_load_file(path: &Path) -> ConfigResult<Option<toml::Value>> {
    match std::fs::read_to_string(path) {
        Ok(content) => parse_file(path, &content).map(Some),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "config file not found, skipping");
            Ok(None)
        },
        Err(e) => Err(ConfigError::ReadError {
            path: path.display().to_string(),
            source: e,
        }),
    }
}

fn parse_file(path: &Path, content: &str) -> ConfigResult<toml::Value> {
    let size = u64::try_from(content.len()).unwrap_or(u64::MAX);
    if size > MAX_CONFIG_FILE_SIZE {
        return Err(ConfigError::ValidationError {
            field: path.display().to_string(),
            message: format!(
                "config file is {size} bytes, exceeding the {MAX_CONFIG_FILE_SIZE} byte limit"
            ),
        });
    }
    toml::from_str(content).map_err(|e| ConfigError::ParseError {
        path: path.display().to_string(),
        source: e,
    })
}

fn home_directory() -> ConfigResult<PathBuf> {
    directories::BaseDirs::new()
        .map(|d| d.home_dir().to_path_buf())
        .ok_or(ConfigError::NoHomeDir)
}

/// Recursively merge `overlay` into `base`; overlay leaves win.
fn deep_merge(base: &mut toml::Value, overlay: &toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                if let Some(base_val) = base_table.get_mut(key) {
                    deep_merge(base_val, overlay_val);
                } else {
                    base_table.insert(key.clone(), overlay_val.clone());
                }
            }
        },
        (base, overlay) => {
            *base = overlay.clone();
        },
    }
}

fn record_layer(val: &toml::Value, prefix: &str, layer: ConfigLayer, sources: &mut FieldSources) {
    if let toml::Value::Table(table) = val {
        for (key, child) in table {
            let path = if prefix.is_empty() {
                key.clone()
            } else {
                format!("{prefix}.{key}")
            };
            record_layer(child, &path, layer, sources);
        }
    } else {
        sources.insert(prefix.to_owned(), layer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_defaults_match_types() {
        let parsed: Config = toml::from_str(DEFAULTS_TOML).unwrap();
        assert_eq!(parsed, Config::default());
    }

    #[test]
    fn test_deep_merge_keeps_siblings() {
        let mut base: toml::Value = toml::from_str("[a]\nx = 1\ny = 2\n").unwrap();
        let overlay: toml::Value = toml::from_str("[a]\ny = 3\n[b]\nz = 4\n").unwrap();
        deep_merge(&mut base, &overlay);
        assert_eq!(base["a"]["x"].as_integer(), Some(1));
        assert_eq!(base["a"]["y"].as_integer(), Some(3));
        assert_eq!(base["b"]["z"].as_integer(), Some(4));
    }

    #[test]
    fn test_record_layer_marks_leaves() {
        let value: toml::Value = toml::from_str("[storage.s3]\nenabled = true\n").unwrap();
        let mut sources = FieldSources::new();
        record_layer(&value, "", ConfigLayer::File, &mut sources);
        assert_eq!(sources.get("storage.s3.enabled"), Some(&ConfigLayer::File));
        assert_eq!(sources.len(), 1);
    }
}
