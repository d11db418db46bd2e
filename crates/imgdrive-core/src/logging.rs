//! File-based logging.
//!
//! The CLI prints results on stdout, so tracing output goes to a daily
//! rolling file under `$IMGDRIVE_HOME/logs` instead of the terminal.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

const LOG_FILE_PREFIX: &str = "imgdrive";

/// Installs the global subscriber.
///
/// The filter comes from `RUST_LOG` when set, otherwise from `default_level`.
/// The returned guard flushes buffered lines on drop; keep it alive for the
/// lifetime of the process.
///
/// # Errors
/// Fails if the log directory cannot be created or a global subscriber is
/// already installed.
pub fn init(log_dir: &Path, default_level: &str) -> Result<WorkerGuard> {
    fs::create_dir_all(log_dir)
        .with_context(|| format!("Failed to create log directory {}", log_dir.display()))?;

    let file_appender = RollingFileAppender::new(Rotation::DAILY, log_dir, LOG_FILE_PREFIX);
    let (writer, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("imgdrive={default_level},imgdrive_core={default_level},warn"))
    });

    let fmt_layer = fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    tracing::debug!(dir = %log_dir.display(), "logging initialized");
    Ok(guard)
}
