//! Logging setup for the `crawl-store` binary.
//!
//! This module provides:
//! - JSON and text log files with daily rotation
//! - Background, non-blocking file writers
//! - Environment-based log level filtering
//! - A compact stderr layer for interactive use
//!
//! The library itself only emits `tracing` events and never installs a subscriber.

use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Flushes the background log writers when dropped. Keep it alive until exit.
#[must_use = "dropping the guard stops file logging"]
pub struct LogGuard {
    _text: WorkerGuard,
    _json: WorkerGuard,
}

/// Initialize the tracing subscriber with text, JSON and stderr layers.
///
/// Writes `crawl_store.log` and `crawl_store.json.log` under `log_dir`, rotated daily.
///
/// # Environment Variables
/// * `RUST_LOG` - Controls log level filtering (default: "info")
///   Examples:
///   - `RUST_LOG=crawl_store=trace` - Every queue and visited operation
///   - `RUST_LOG=warn` - Only failures, such as swallowed cookie errors
pub fn init_logging<P: AsRef<Path>>(log_dir: P) -> Result<LogGuard, Box<dyn std::error::Error>> {
    let log_path = log_dir.as_ref();
    std::fs::create_dir_all(log_path)?;

    let env_filter = default_filter()?;

    let text_file_appender = tracing_appender::rolling::daily(log_path, "crawl_store.log");
    let (text_writer, text_guard) = tracing_appender::non_blocking(text_file_appender);

    let json_file_appender = tracing_appender::rolling::daily(log_path, "crawl_store.json.log");
    let (json_writer, json_guard) = tracing_appender::non_blocking(json_file_appender);

    let text_layer = fmt::layer()
        .with_writer(text_writer)
        .with_target(true)
        .with_thread_ids(true)
        .with_thread_names(true)
        .with_line_number(true)
        .with_ansi(false)
        .compact()
        .with_filter(env_filter.clone());

    let json_layer = fmt::layer()
        .json()
        .with_writer(json_writer)
        .with_target(true)
        .with_thread_ids(true)
        .with_current_span(true)
        .with_span_list(true)
        .with_filter(env_filter.clone());

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .with_filter(env_filter);

    tracing_subscriber::registry()
        .with(text_layer)
        .with(json_layer)
        .with(stderr_layer)
        .try_init()?;

    tracing::debug!("Logging initialized - logs will be written to {}", log_path.display());

    Ok(LogGuard {
        _text: text_guard,
        _json: json_guard,
    })
}

/// Stderr-only logging, for runs without a log directory.
pub fn init_stderr_logging() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .compact()
                .with_filter(default_filter()?),
        )
        .try_init()?;
    Ok(())
}

fn default_filter() -> Result<EnvFilter, Box<dyn std::error::Error>> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => Ok(EnvFilter::try_new("info")?),
    }
}
