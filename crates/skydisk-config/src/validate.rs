//! Post-merge configuration validation.

use crate::error::{ConfigError, ConfigResult};
use crate::types::Config;

const VALID_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];
const VALID_FORMATS: &[&str] = &["pretty", "compact", "json", "full"];

/// Validate a fully merged configuration.
///
/// # Errors
///
/// Returns the first validation error found.
pub fn validate(config: &Config) -> ConfigResult<()> {
    validate_storage(config)?;
    validate_links(config)?;
    validate_logging(config)?;
    Ok(())
}

fn invalid(field: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError {
        field: field.to_owned(),
        message: message.into(),
    }
}

fn is_http_url(value: &str) -> bool {
    let rest = value
        .strip_prefix("http://")
        .or_else(|| value.strip_prefix("https://"));
    rest.is_some_and(|host| !host.is_empty() && !host.starts_with('/'))
}

fn validate_storage(config: &Config) -> ConfigResult<()> {
    if config.storage.local.base_path.trim().is_empty() {
        return Err(invalid(
            "storage.local.base_path",
            "base_path must not be empty",
        ));
    }

    let s3 = &config.storage.s3;
    if !s3.enabled {
        return Ok(());
    }
    if s3.name.trim().is_empty() {
        return Err(invalid("storage.s3.name", "name must not be empty"));
    }
    if !is_http_url(&s3.endpoint) {
        return Err(invalid(
            "storage.s3.endpoint",
            format!("'{}' is not an http(s) URL", s3.endpoint),
        ));
    }
    validate_bucket(&s3.bucket)?;
    if s3.access_key.is_empty() {
        return Err(invalid("storage.s3.access_key", "access_key must not be empty"));
    }
    if s3.secret_key.is_empty() {
        return Err(invalid("storage.s3.secret_key", "secret_key must not be empty"));
    }
    if s3.base_path.split('/').any(|segment| segment == "..") {
        return Err(invalid(
            "storage.s3.base_path",
            "base_path must not contain '..' segments",
        ));
    }
    Ok(())
}

fn validate_bucket(bucket: &str) -> ConfigResult<()> {
    let len_ok = (3..=63).contains(&bucket.len());
    let chars_ok = bucket
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '.');
    let edges_ok = bucket
        .chars()
        .next()
        .zip(bucket.chars().last())
        .is_some_and(|(first, last)| first.is_ascii_alphanumeric() && last.is_ascii_alphanumeric());
    if len_ok && chars_ok && edges_ok {
        Ok(())
    } else {
        Err(invalid(
            "storage.s3.bucket",
            format!(
                "'{bucket}' is not a valid bucket name; use 3-63 lowercase letters, digits, '-' or '.'"
            ),
        ))
    }
}

fn validate_links(config: &Config) -> ConfigResult<()> {
    let links = &config.links;
    if !links.public_base_url.is_empty() && !is_http_url(&links.public_base_url) {
        return Err(invalid(
            "links.public_base_url",
            format!("'{}' is not an http(s) URL", links.public_base_url),
        ));
    }
    if links.purge_interval_secs == 0 {
        return Err(invalid(
            "links.purge_interval_secs",
            "purge_interval_secs must be at least 1",
        ));
    }
    Ok(())
}

fn validate_logging(config: &Config) -> ConfigResult<()> {
    let logging = &config.logging;
    if !VALID_LEVELS.contains(&logging.level.to_ascii_lowercase().as_str()) {
        return Err(invalid(
            "logging.level",
            format!(
                "unsupported level '{}'; expected one of: {}",
                logging.level,
                VALID_LEVELS.join(", ")
            ),
        ));
    }
    if !VALID_FORMATS.contains(&logging.format.to_ascii_lowercase().as_str()) {
        return Err(invalid(
            "logging.format",
            format!(
                "unsupported format '{}'; expected one of: {}",
                logging.format,
                VALID_FORMATS.join(", ")
            ),
        ));
    }
    Ok(())
}
