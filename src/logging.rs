//! File logging.
//!
//! The terminal belongs to the TUI, so `tracing` output goes to a fresh,
//! timestamped file per launch:
//!
//! ```text
//! <data-dir>/logs/san-do-cu-2026-03-01_14-30-00.log
//! ```
//!
//! Filtering follows `RUST_LOG`, defaulting to `san_do_cu=info`.  Only the
//! newest [`KEEP_LOGS`] files are kept.
//!
//! Logging is best-effort: if the directory cannot be created or the file
//! cannot be opened, [`init_or_warn`] prints one line to stderr and the
//! program runs without a subscriber.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const PREFIX: &str = "san-do-cu-";
const KEEP_LOGS: usize = 5;

/// Install the global subscriber. Returns the path of the new log file.
pub fn init(logs_dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(logs_dir)
        .with_context(|| format!("failed to create log directory {}", logs_dir.display()))?;

    // Make room for the file about to be created. Reported once logging is up.
    let rotation = rotate_logs(logs_dir, KEEP_LOGS.saturating_sub(1));

    let timestamp = chrono::Local::now().format("%Y-%m-%d_%H-%M-%S");
    let path = logs_dir.join(format!("{PREFIX}{timestamp}.log"));
    let file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("failed to open log file {}", path.display()))?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "san_do_cu=info".into()))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false),
        )
        .try_init()
        .context("a tracing subscriber is already installed")?;

    if let Err(e) = rotation {
        tracing::warn!(dir = %logs_dir.display(), error = %e, "log rotation failed");
    }
    Ok(path)
}

/// Like [`init`], but a failure only costs the log file.
pub fn init_or_warn(logs_dir: &Path) -> Option<PathBuf> {
    match init(logs_dir) {
        Ok(path) => Some(path),
        Err(e) => {
            eprintln!("san-do-cu: logging disabled: {e:#}");
            None
        }
    }
}

/// Delete old log files, keeping the most recent `keep`.
fn rotate_logs(logs_dir: &Path, keep: usize) -> io::Result<()> {
    let mut logs: Vec<(PathBuf, std::time::SystemTime)> = Vec::new();

    for entry in fs::read_dir(logs_dir)? {
        let entry = entry?;
        let path = entry.path();
        let is_ours = path.extension().and_then(|e| e.to_str()) == Some("log")
            && path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with(PREFIX));
        if !is_ours {
            continue;
        }
        let modified = entry
            .metadata()
            .and_then(|m| m.modified())
            .unwrap_or(std::time::UNIX_EPOCH);
        logs.push((path, modified));
    }

    // Newest first; ties broken by name, which embeds the timestamp.
    logs.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| b.0.cmp(&a.0)));

    for (path, _) in logs.iter().skip(keep) {
        let _ = fs::remove_file(path);
    }
    Ok(())
}
