//! Bridge from `skydisk_config::Config` to telemetry types.

use skydisk_config::Config;
use skydisk_telemetry::{LogConfig, LogFormat, LogTarget};

/// Log settings for the CLI. Output goes to stderr so command output on
/// stdout stays clean.
pub(crate) fn to_log_config(cfg: &Config, verbose: bool) -> LogConfig {
    let format = cfg.logging.format.parse().unwrap_or(LogFormat::Compact);
    let level = if verbose { "debug" } else { cfg.logging.level.as_str() };

    let mut log_config = LogConfig::new(level)
        .with_format(format)
        .with_target(LogTarget::Stderr);
    for directive in &cfg.logging.directives {
        log_config = log_config.with_directive(directive);
    }
    log_config
}
