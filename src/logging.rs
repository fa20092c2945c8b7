//! Logging setup for the binary.
//!
//! The terminal is in raw alternate-screen mode while playing, so logs go to a
//! file instead of stderr.

use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::level_filters::LevelFilter;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Keeps the background writer alive. Logs still buffered are flushed on drop.
pub struct LogGuard {
    _guard: WorkerGuard,
}

/// Install a file logger at `level`. `RUST_LOG` takes precedence when set.
pub fn init(log_file: &Path, level: LevelFilter) -> Result<LogGuard> {
    let file = File::create(log_file)
        .with_context(|| format!("Failed to create log file: {}", log_file.display()))?;
    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    let file_layer = fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_filter(filter);

    tracing_subscriber::registry()
        .with(file_layer)
        .try_init()
        .context("Failed to install the log subscriber")?;

    tracing::info!(path = %log_file.display(), %level, "logging initialized");
    Ok(LogGuard { _guard: guard })
}
