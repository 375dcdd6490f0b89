//! Logging setup for the statpilot binary.
//!
//! The library only emits `tracing` events; installing a subscriber is left
//! to the binary. Diagnostics go to stderr so that JSON on stdout stays
//! machine-readable, and can additionally be written to a daily-rotated file
//! in the platform data directory.
//!
//! ```no_run
//! use statpilot::logging::{self, LogOptions};
//!
//! logging::init(&LogOptions { verbose: true, to_file: false }).expect("logging");
//! tracing::debug!("visible with --verbose");
//! ```

use anyhow::{Context as _, Result};
use std::path::PathBuf;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt as _, util::SubscriberInitExt as _};

#[derive(Debug, Clone, Copy, Default)]
pub struct LogOptions {
    /// Raise the default level from `info` to `debug`.
    pub verbose: bool,
    /// Also write logs under [`get_log_dir`].
    pub to_file: bool,
}

/// Log directory following platform conventions, created on first use.
///
/// - Windows: `%APPDATA%/statpilot/logs`
/// - macOS: `~/Library/Application Support/statpilot/logs`
/// - Linux: `~/.local/share/statpilot/logs`
pub fn get_log_dir() -> Result<PathBuf> {
    let base_dir = dirs::data_dir().context("Failed to determine data directory")?;
    let log_dir = base_dir.join("statpilot").join("logs");

    if !log_dir.exists() {
        std::fs::create_dir_all(&log_dir)
            .with_context(|| format!("Failed to create log directory: {}", log_dir.display()))?;
    }

    Ok(log_dir)
}

fn default_directive(options: &LogOptions) -> &'static str {
    if options.verbose { "debug" } else { "info" }
}

/// Installs the global subscriber. `RUST_LOG` overrides the default level.
///
/// # Errors
///
/// Returns error if the filter is invalid or the log file cannot be created.
pub fn init(options: &LogOptions) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directive(options)))
        .context("Failed to create env filter")?;

    let stderr_layer = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    let file_layer = if options.to_file {
        let log_dir = get_log_dir()?;
        let appender = RollingFileAppender::builder()
            .rotation(Rotation::DAILY)
            .max_log_files(10)
            .filename_prefix("statpilot")
            .filename_suffix("log")
            .build(&log_dir)
            .context("Failed to create log file appender")?;
        Some(
            fmt::layer()
                .with_target(true)
                .with_line_number(true)
                .with_file(true)
                .with_ansi(false)
                .with_writer(appender),
        )
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .context("Logging already initialised")?;

    tracing::debug!("Logging initialised");
    Ok(())
}

/// Path of today's log file when file logging is on. The appender rotates
/// on UTC dates.
pub fn get_current_log_path() -> Result<PathBuf> {
    let log_dir = get_log_dir()?;
    let today = chrono::Utc::now().format("%Y-%m-%d").to_string();
    Ok(log_dir.join(format!("statpilot.{today}.log")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directive() {
        assert_eq!(default_directive(&LogOptions::default()), "info");
        assert_eq!(
            default_directive(&LogOptions {
                verbose: true,
                to_file: false
            }),
            "debug"
        );
    }

    #[test]
    fn test_current_log_path_is_dated() {
        let Ok(path) = get_current_log_path() else {
            return;
        };
        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
        let today = chrono::Utc::now().format("%Y-%m-%d");
        assert_eq!(name, format!("statpilot.{today}.log"));
    }
}
