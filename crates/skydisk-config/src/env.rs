//! `SKYDISK_*` environment overrides.
//!
//! Environment variables override both the defaults and the config file.

use std::collections::HashMap;

use tracing::debug;

use crate::error::{ConfigError, ConfigResult};
use crate::loader::{ConfigLayer, FieldSources};

#[derive(Debug, Clone, Copy)]
enum Kind {
    Str,
    Bool,
    Int,
    List,
}

struct EnvMapping {
    var_name: &'static str,
    field_path: &'static str,
    kind: Kind,
}

const fn mapping(var_name: &'static str, field_path: &'static str, kind: Kind) -> EnvMapping {
    EnvMapping {
        var_name,
        field_path,
        kind,
    }
}

const ENV_MAPPINGS: &[EnvMapping] = &[
    mapping("SKYDISK_LOCAL_BASE_PATH", "storage.local.base_path", Kind::Str),
    mapping("SKYDISK_S3_ENABLED", "storage.s3.enabled", Kind::Bool),
    mapping("SKYDISK_S3_NAME", "storage.s3.name", Kind::Str),
    mapping("SKYDISK_S3_ENDPOINT", "storage.s3.endpoint", Kind::Str),
    mapping("SKYDISK_S3_BUCKET", "storage.s3.bucket", Kind::Str),
    mapping("SKYDISK_S3_ACCESS_KEY", "storage.s3.access_key", Kind::Str),
    mapping("SKYDISK_S3_SECRET_KEY", "storage.s3.secret_key", Kind::Str),
    mapping("SKYDISK_S3_REGION", "storage.s3.region", Kind::Str),
    mapping("SKYDISK_S3_BASE_PATH", "storage.s3.base_path", Kind::Str),
    mapping("SKYDISK_CATALOG_PATH", "catalog.path", Kind::Str),
    mapping("SKYDISK_PUBLIC_BASE_URL", "links.public_base_url", Kind::Str),
    mapping("SKYDISK_LINK_PURGE_INTERVAL_SECS", "links.purge_interval_secs", Kind::Int),
    mapping("SKYDISK_LOG_LEVEL", "logging.level", Kind::Str),
    mapping("SKYDISK_LOG_FORMAT", "logging.format", Kind::Str),
    mapping("SKYDISK_LOG_DIRECTIVES", "logging.directives", Kind::List),
];

/// Snapshot the process environment, keeping only `SKYDISK_*` variables.
#[must_use]
pub fn collect_env_vars() -> HashMap<String, String> {
    std::env::vars()
        .filter(|(name, _)| name.starts_with("SKYDISK_"))
        .collect()
}

/// Names of every recognized override variable.
pub fn known_vars() -> impl Iterator<Item = &'static str> {
    ENV_MAPPINGS.iter().map(|m| m.var_name)
}

fn parse(mapping: &EnvMapping, raw: &str) -> ConfigResult<toml::Value> {
    let err = |message: String| ConfigError::EnvError {
        var_name: mapping.var_name.to_owned(),
        message,
    };
    match mapping.kind {
        Kind::Str => Ok(toml::Value::String(raw.to_owned())),
        Kind::Bool => match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(toml::Value::Boolean(true)),
            "0" | "false" | "no" | "off" => Ok(toml::Value::Boolean(false)),
            other => Err(err(format!("'{other}' is not a boolean"))),
        },
        Kind::Int => raw
            .trim()
            .parse::<i64>()
            .map(toml::Value::Integer)
            .map_err(|e| err(format!("'{raw}' is not an integer: {e}"))),
        Kind::List => Ok(toml::Value::Array(
            raw.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|s| toml::Value::String(s.to_owned()))
                .collect(),
        )),
    }
}

fn set_path(root: &mut toml::Value, dotted: &str, value: toml::Value) {
    let mut node = root;
    let mut parts = dotted.split('.').peekable();
    while let Some(part) = parts.next() {
        let Some(table) = node.as_table_mut() else {
            return;
        };
        if parts.peek().is_none() {
            table.insert(part.to_owned(), value);
            return;
        }
        node = table
            .entry(part.to_owned())
            .or_insert(toml::Value::Table(toml::map::Map::new()));
    }
}

/// Apply every recognized variable in `env` onto `merged`.
///
/// Returns the names of the variables that were applied.
///
/// # Errors
///
/// Returns [`ConfigError::EnvError`] if a variable cannot be parsed as the
/// type of its field.
pub fn apply_env_overrides(
    merged: &mut toml::Value,
    env: &HashMap<String, String>,
    sources: &mut FieldSources,
) -> ConfigResult<Vec<String>> {
    let mut applied = Vec::new();
    for mapping in ENV_MAPPINGS {
        let Some(raw) = env.get(mapping.var_name) else {
            continue;
        };
        let value = parse(mapping, raw)?;
        set_path(merged, mapping.field_path, value);
        sources.insert(mapping.field_path.to_owned(), ConfigLayer::Env);
        debug!(var = mapping.var_name, field = mapping.field_path, "applied env override");
        applied.push(mapping.var_name.to_owned());
    }
    Ok(applied)
}
