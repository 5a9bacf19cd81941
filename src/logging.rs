//! Diagnostic logging setup for the binary.

use std::fmt;
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result, anyhow};
use chrono::Utc;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::FormatTime;

/// Default filter when logging to stderr.
const STDERR_FILTER: &str = "locker=warn";
/// Default filter for the log file.
const FILE_FILTER: &str = "locker=info";

/// Where log lines go.
#[derive(Debug, Clone)]
pub enum LogTarget {
    Stderr,
    /// Append-only log file, created if missing.
    File(PathBuf),
}

impl LogTarget {
    pub fn from_option(path: Option<PathBuf>) -> Self {
        match path {
            Some(path) => LogTarget::File(path),
            None => LogTarget::Stderr,
        }
    }
}

/// `YYYY-MM-DD HH:MM:SS UTC`
struct UtcTimer;

impl FormatTime for UtcTimer {
    fn format_time(&self, w: &mut Writer<'_>) -> fmt::Result {
        write!(w, "{}", Utc::now().format("%Y-%m-%d %H:%M:%S UTC"))
    }
}

fn env_filter(default: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into())
}

/// Installs the global subscriber. Call once at process start.
pub fn init(target: LogTarget) -> Result<()> {
    let installed = match target {
        LogTarget::Stderr => tracing_subscriber::fmt()
            .with_env_filter(env_filter(STDERR_FILTER))
            .with_timer(UtcTimer)
            .with_writer(std::io::stderr)
            .try_init(),
        LogTarget::File(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .with_context(|| format!("cannot open log file {}", path.display()))?;

            tracing_subscriber::fmt()
                .with_env_filter(env_filter(FILE_FILTER))
                .with_timer(UtcTimer)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
        }
    };

    installed.map_err(|e| anyhow!("failed to install logger: {e}"))
}
