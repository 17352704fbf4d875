//! Config command - show the resolved configuration.

use std::path::Path;

use skydisk_config::{Config, ShowFormat};

use crate::theme::Theme;

/// Print the resolved configuration with secrets redacted.
pub(crate) fn show(config_path: Option<&Path>, format: &str) -> anyhow::Result<()> {
    let format: ShowFormat = format.parse().map_err(anyhow::Error::msg)?;
    let resolved = Config::load(config_path)?;
    print!("{}", resolved.show(format)?);
    if !resolved.env_overrides.is_empty() {
        eprintln!(
            "{}",
            Theme::dimmed(&format!(
                "environment overrides: {}",
                resolved.env_overrides.join(", ")
            ))
        );
    }
    Ok(())
}
