//! Logging setup
//!
//! The terminal UI owns stdout, so interactive runs log to `topanime.log` in
//! the cache directory through a non-blocking writer. Print mode logs to stderr.
//! `RUST_LOG` overrides the default `info` filter.

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// Name of the log file inside the log directory
pub const LOG_FILE_NAME: &str = "topanime.log";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Installs a subscriber that appends to `<log_dir>/topanime.log`
///
/// The returned guard flushes buffered lines when dropped; keep it alive for
/// the whole run.
pub fn init_file(log_dir: &Path) -> std::io::Result<(WorkerGuard, PathBuf)> {
    fs::create_dir_all(log_dir)?;
    let log_path = log_dir.join(LOG_FILE_NAME);
    let file = OpenOptions::new().create(true).append(true).open(&log_path)?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file);
    // A subscriber may already be installed (tests); keep it.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_target(false)
        .with_ansi(false)
        .with_writer(non_blocking)
        .try_init();

    tracing::info!(path = %log_path.display(), "logging initialized");
    Ok((guard, log_path))
}

/// Installs a subscriber writing to stderr
pub fn init_stderr() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
