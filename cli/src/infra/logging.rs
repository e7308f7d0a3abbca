//! File-backed `tracing` subscriber.
//!
//! The monitor owns the terminal, so log events go to
//! `<artifacts_dir>/fleet.log` instead of stderr.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

/// Log file name inside the artifacts directory.
pub const LOG_FILE: &str = "fleet.log";

/// Install the global subscriber, appending to `<artifacts_dir>/fleet.log`.
///
/// Filter comes from `RUST_LOG`, defaulting to `info`. Returns the log path.
///
/// # Errors
///
/// Returns an error if the artifacts directory or log file cannot be created.
pub fn init(artifacts_dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(artifacts_dir)
        .with_context(|| format!("cannot create {}", artifacts_dir.display()))?;
    let path = artifacts_dir.join(LOG_FILE);
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("cannot open {}", path.display()))?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // A subscriber may already be installed (tests); keep it.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .try_init();
    Ok(path)
}
