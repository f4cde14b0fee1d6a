//! Append-only activity log, the watcher's only user-facing output.
//!
//! Each entry is one line `[YYYY-MM-DD HH:MM:SS] [TAG] message`; error
//! chains continue on indented `caused by:` lines. Every entry is mirrored
//! to `tracing` at the matching level.

use std::error::Error;
use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDateTime};

use progwatch_core::WatcherConfig;

use crate::log_rotation;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Init,
    Info,
    Warn,
    Error,
}

impl Severity {
    pub fn tag(self) -> &'static str {
        match self {
            Severity::Init => "[INIT]",
            Severity::Info => "[INFO]",
            Severity::Warn => "[WARN]",
            Severity::Error => "[ERREUR]",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Format one entry. Pure; the timestamp is passed in.
pub fn format_line(at: NaiveDateTime, severity: Severity, message: &str) -> String {
    format!("[{}] {} {}", at.format("%Y-%m-%d %H:%M:%S"), severity, message)
}

/// `err` followed by one indented `caused by:` line per source.
pub fn render_chain(err: &dyn Error) -> String {
    let mut out = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        out.push_str("\n    caused by: ");
        out.push_str(&cause.to_string());
        source = cause.source();
    }
    out
}

#[derive(Debug, Clone)]
pub struct ActivityLog {
    path: PathBuf,
    max_bytes: u64,
    max_files: usize,
}

impl ActivityLog {
    pub fn new(path: impl Into<PathBuf>, max_bytes: u64, max_files: usize) -> Self {
        Self {
            path: path.into(),
            max_bytes,
            max_files,
        }
    }

    pub fn from_config(config: &WatcherConfig) -> Self {
        Self::new(config.log_path(), config.log.max_bytes, config.log.max_files)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one entry. A log that cannot be written is reported through
    /// `tracing` only; logging never interrupts the watcher.
    pub fn write(&self, severity: Severity, message: &str) {
        match severity {
            Severity::Init | Severity::Info => tracing::info!("{message}"),
            Severity::Warn => tracing::warn!("{message}"),
            Severity::Error => tracing::error!("{message}"),
        }

        let line = format_line(Local::now().naive_local(), severity, message);
        let result = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .and_then(|mut file| writeln!(file, "{line}"));
        if let Err(err) = result {
            tracing::warn!(path = %self.path.display(), error = %err, "activity log write failed");
        }
    }

    pub fn init(&self, message: &str) {
        self.write(Severity::Init, message);
    }

    pub fn info(&self, message: &str) {
        self.write(Severity::Info, message);
    }

    pub fn warn(&self, message: &str) {
        self.write(Severity::Warn, message);
    }

    pub fn error(&self, message: &str) {
        self.write(Severity::Error, message);
    }

    /// `[ERREUR] <context>: <error>` plus its full cause chain.
    pub fn error_chain(&self, context: &str, err: &dyn Error) {
        self.error(&format!("{context}: {}", render_chain(err)));
    }

    /// Rotate the log file when it has grown past its size limit.
    pub fn rotate_if_needed(&self) {
        match log_rotation::rotate_if_needed(&self.path, self.max_bytes, self.max_files) {
            Ok(true) => tracing::info!(path = %self.path.display(), "activity log rotated"),
            Ok(false) => {}
            Err(err) => {
                tracing::warn!(path = %self.path.display(), error = %err, "activity log rotation failed")
            }
        }
    }
}
