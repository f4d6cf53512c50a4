//! Tracing subscriber setup
//!
//! One-shot commands log to stderr. The TUI owns the terminal, so it logs to
//! `~/.prestatrack/prestatrack.log` instead.

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use directories::BaseDirs;
use tracing_subscriber::EnvFilter;

use crate::types::{PrestaError, Result};

/// Filter directive variable, e.g. `PRESTATRACK_LOG=prestatrack=debug`
pub const ENV_LOG: &str = "PRESTATRACK_LOG";

const DEFAULT_DIRECTIVE: &str = "warn";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env(ENV_LOG).unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE))
}

/// Log to stderr. A second call is a no-op.
pub fn init_stderr() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Log to an append-only file
pub fn init_file(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(path)?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .map_err(|e| PrestaError::Config(format!("logger already set: {}", e)))
}

/// Default TUI log file (~/.prestatrack/prestatrack.log)
pub fn default_log_path() -> Result<PathBuf> {
    let base_dirs = BaseDirs::new()
        .ok_or_else(|| PrestaError::Config("Cannot determine home directory".into()))?;
    Ok(base_dirs
        .home_dir()
        .join(".prestatrack")
        .join("prestatrack.log"))
}
