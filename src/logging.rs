//! Logging setup using `tracing` + `tracing-subscriber`.
//!
//! Priority for determining the filter:
//! 1. `SHELLRUN_LOG` environment variable (e.g. "debug", "shellrun=trace")
//! 2. `--verbose` selects `debug`
//! 3. default to `warn`
//!
//! Logs always go to stderr; stdout carries captured command output.

use anyhow::{anyhow, Result};
use clap::ValueEnum;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter
pub const LOG_ENV: &str = "SHELLRUN_LOG";

/// Log line format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Text,
    /// One JSON object per line
    Json,
}

/// Initialise the global logging subscriber.
///
/// Call once at startup.
pub fn init_logging(verbose: bool, format: LogFormat) -> Result<()> {
    let filter = build_filter(std::env::var(LOG_ENV).ok().as_deref(), verbose);

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(verbose);

    match format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    }
    .map_err(|e| anyhow!("Failed to initialise logging: {}", e))
}

fn build_filter(env_value: Option<&str>, verbose: bool) -> EnvFilter {
    let fallback = if verbose { "debug" } else { "warn" };

    match env_value.map(str::trim).filter(|s| !s.is_empty()) {
        Some(directives) => EnvFilter::try_new(directives).unwrap_or_else(|e| {
            eprintln!("Ignoring invalid {}='{}': {}", LOG_ENV, directives, e);
            EnvFilter::new(fallback)
        }),
        None => EnvFilter::new(fallback),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_defaults_to_warn() {
        assert_eq!(build_filter(None, false).to_string(), "warn");
    }

    #[test]
    fn test_filter_verbose_is_debug() {
        assert_eq!(build_filter(None, true).to_string(), "debug");
    }

    #[test]
    fn test_filter_env_wins() {
        let filter = build_filter(Some("shellrun=trace"), false);
        assert_eq!(filter.to_string(), "shellrun=trace");
    }

    #[test]
    fn test_filter_blank_env_ignored() {
        assert_eq!(build_filter(Some("   "), true).to_string(), "debug");
    }
}
