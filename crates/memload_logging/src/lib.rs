//! Shared logging setup for memload binaries.

use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::path::Path;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

const DEFAULT_LOG_FILTER: &str = "memload=info";

/// Logging configuration for the loader binary.
pub struct LogConfig<'a> {
    /// Raise the console filter to `debug`.
    pub verbose: bool,
    /// Append-mode log file (`--log <path>`). When set, every log line also
    /// goes here, independent of the console filter.
    pub log_file: Option<&'a Path>,
    /// Emit the file-backed stream as newline-delimited JSON instead of
    /// human-readable text.
    pub log_json: bool,
}

/// Initialize tracing for the process. Call once, at the top of `main`.
pub fn init_logging(config: LogConfig<'_>) -> Result<()> {
    let base_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let console_filter = if config.verbose {
        EnvFilter::new("debug")
    } else {
        base_filter.clone()
    };

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(console_filter);

    let file_layer = match config.log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("failed to open log file: {}", path.display()))?;

            let layer = if config.log_json {
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(file)
                    .with_ansi(false)
                    .with_filter(base_filter)
                    .boxed()
            } else {
                tracing_subscriber::fmt::layer()
                    .with_writer(file)
                    .with_ansi(false)
                    .with_filter(base_filter)
                    .boxed()
            };
            Some(layer)
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .init();

    Ok(())
}
