//! Resolved configuration and its annotated display.

use serde::Serialize;

use crate::error::{ConfigError, ConfigResult};
use crate::loader::{ConfigLayer, FieldSources};
use crate::types::Config;

const REDACTED: &str = "[REDACTED]";

/// Output format for [`ResolvedConfig::show`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShowFormat {
    /// TOML with a trailing `# from <layer>` comment on each value.
    #[default]
    Toml,
    /// Pretty-printed JSON.
    Json,
}

impl std::str::FromStr for ShowFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "toml" => Ok(Self::Toml),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown show format '{other}'; expected toml or json")),
        }
    }
}

/// A validated configuration plus where each value came from.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// The final configuration.
    pub config: Config,
    /// Dotted field path to the layer that last set it.
    pub field_sources: FieldSources,
    /// Config files that were merged, in order.
    pub loaded_files: Vec<String>,
    /// Environment variables that overrode a value.
    pub env_overrides: Vec<String>,
}

#[derive(Serialize)]
struct JsonView<'a> {
    config: &'a toml::Value,
    loaded_files: &'a [String],
    env_overrides: &'a [String],
}

impl ResolvedConfig {
    /// Layer that set `field`, if known.
    #[must_use]
    pub fn source_of(&self, field: &str) -> Option<ConfigLayer> {
        self.field_sources.get(field).copied()
    }

    /// Render the configuration with secrets redacted.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError::ValidationError`] if the config cannot be
    /// serialized.
    pub fn show(&self, format: ShowFormat) -> ConfigResult<String> {
        let value = self.redacted_value()?;
        match format {
            ShowFormat::Json => serde_json::to_string_pretty(&JsonView {
                config: &value,
                loaded_files: &self.loaded_files,
                env_overrides: &self.env_overrides,
            })
            .map_err(|e| serialize_error(&e.to_string())),
            ShowFormat::Toml => Ok(self.annotated_toml(&value)),
        }
    }

    fn redacted_value(&self) -> ConfigResult<toml::Value> {
        let mut value =
            toml::Value::try_from(&self.config).map_err(|e| serialize_error(&e.to_string()))?;
        if let Some(s3) = value
            .get_mut("storage")
            .and_then(|storage| storage.get_mut("s3"))
            .and_then(toml::Value::as_table_mut)
        {
            s3.insert("secret_key".to_owned(), toml::Value::String(REDACTED.to_owned()));
        }
        Ok(value)
    }

    fn annotated_toml(&self, value: &toml::Value) -> String {
        let mut out = String::new();
        if self.loaded_files.is_empty() {
            out.push_str("# no config file loaded\n");
        } else {
            for file in &self.loaded_files {
                out.push_str(&format!("# loaded: {file}\n"));
            }
        }
        if let Some(root) = value.as_table() {
            self.write_table(&mut out, root, "");
        }
        out
    }

    fn write_table(&self, out: &mut String, table: &toml::map::Map<String, toml::Value>, prefix: &str) {
        let (leaves, children): (Vec<_>, Vec<_>) =
            table.iter().partition(|(_, value)| !value.is_table());

        if !prefix.is_empty() && !leaves.is_empty() {
            out.push_str(&format!("\n[{prefix}]\n"));
        }
        for (key, value) in leaves {
            let path = if prefix.is_empty() {
                key.clone()
            } else {
                format!("{prefix}.{key}")
            };
            let layer = self
                .source_of(&path)
                .map_or_else(|| "defaults".to_owned(), |l| l.to_string());
            out.push_str(&format!("{key} = {value}  # from {layer}\n"));
        }
        for (key, value) in children {
            let path = if prefix.is_empty() {
                key.clone()
            } else {
                format!("{prefix}.{key}")
            };
            if let Some(child) = value.as_table() {
                self.write_table(out, child, &path);
            }
        }
    }
}

fn serialize_error(message: &str) -> ConfigError {
    ConfigError::ValidationError {
        field: "<root>".to_owned(),
        message: format!("failed to serialize config: {message}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolved() -> ResolvedConfig {
        let mut config = Config::default();
        config.storage.s3.secret_key = "hunter2".to_owned();
        let mut field_sources = FieldSources::new();
        field_sources.insert("links.purge_interval_secs".to_owned(), ConfigLayer::Env);
        ResolvedConfig {
            config,
            field_sources,
            loaded_files: Vec::new(),
            env_overrides: vec!["SKYDISK_LINK_PURGE_INTERVAL_SECS".to_owned()],
        }
    }

    #[test]
    fn test_toml_is_annotated_and_redacted() {
        let out = resolved().show(ShowFormat::Toml).unwrap();
        assert!(!out.contains("hunter2"));
        assert!(out.contains("[storage.s3]"));
        assert!(out.contains("purge_interval_secs = 3600  # from env"));
        assert!(out.contains("# no config file loaded"));
    }

    #[test]
    fn test_json_is_redacted() {
        let out = resolved().show(ShowFormat::Json).unwrap();
        assert!(!out.contains("hunter2"));
        let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed["config"]["storage"]["s3"]["secret_key"], REDACTED);
    }

    #[test]
    fn test_show_format_parse() {
        assert_eq!("JSON".parse::<ShowFormat>().unwrap(), ShowFormat::Json);
        assert!("yaml".parse::<ShowFormat>().is_err());
    }
}
