//! Configuration types for the progression watcher.
//!
//! All path fields use `PathBuf`; relative paths are resolved against
//! [`WatcherConfig::repo`]. Every section carries serde defaults so a minimal
//! YAML file only needs `repo` and `files`.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// Identifier of a class whose progression spreadsheet is watched (e.g. `302`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClassCode(pub String);

impl fmt::Display for ClassCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for ClassCode {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ClassCode {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Config sections
// ---------------------------------------------------------------------------

/// A source spreadsheet and the page generated from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchedFile {
    pub class: ClassCode,
    /// Spreadsheet polled for changes. Usually outside the repo.
    pub source: PathBuf,
    /// Generated page whose mtime is refreshed after an export.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollConfig {
    pub interval_secs: u64,
    /// Sleep after a failed tick.
    pub error_interval_secs: u64,
    /// Consecutive unchanged polls before a file counts as settled.
    pub stabilize_window: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_secs: 3,
            error_interval_secs: 3,
            stabilize_window: 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Preferred interpreter binary, used only when it exists on disk.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interpreter: Option<PathBuf>,
    /// Interpreter name resolved through `PATH` when the preferred one is absent.
    pub fallback_interpreter: String,
    pub script: PathBuf,
    pub args: Vec<String>,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            interpreter: None,
            fallback_interpreter: "python".to_string(),
            script: PathBuf::from("export_progression_public.py"),
            args: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PublishConfig {
    pub enabled: bool,
    pub git: String,
    /// Repo-relative paths staged before every commit.
    pub paths: Vec<PathBuf>,
    pub message_prefix: String,
    /// Extra push attempts after a failed `git push`.
    ///
    /// The delay between attempts is a blocking sleep on the poll thread,
    /// so Ctrl-C is only honoured once the last attempt has returned.
    pub push_retries: u32,
    pub push_retry_delay_secs: u64,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            git: "git".to_string(),
            paths: vec![
                PathBuf::from("docs/progressions"),
                PathBuf::from("docs/assets"),
            ],
            message_prefix: "MAJ auto".to_string(),
            push_retries: 0,
            push_retry_delay_secs: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub file: PathBuf,
    pub max_bytes: u64,
    pub max_files: usize,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            file: PathBuf::from("autom_update.log"),
            max_bytes: 10 * 1024 * 1024,
            max_files: 5,
        }
    }
}

/// Root of the watcher YAML configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatcherConfig {
    /// Repository root: export working directory and git checkout.
    pub repo: PathBuf,
    /// Hide console windows of spawned processes.
    #[serde(default = "default_true")]
    pub suppress_window: bool,
    #[serde(default)]
    pub poll: PollConfig,
    #[serde(default)]
    pub export: ExportConfig,
    #[serde(default)]
    pub publish: PublishConfig,
    #[serde(default)]
    pub log: LogConfig,
    #[serde(default)]
    pub files: Vec<WatchedFile>,
}

fn default_true() -> bool {
    true
}

impl WatcherConfig {
    /// A config with default sections and no watched files.
    pub fn new(repo: impl Into<PathBuf>) -> Self {
        Self {
            repo: repo.into(),
            suppress_window: true,
            poll: PollConfig::default(),
            export: ExportConfig::default(),
            publish: PublishConfig::default(),
            log: LogConfig::default(),
            files: Vec::new(),
        }
    }

    /// Resolve `path` against the repo root unless it is already absolute.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.repo.join(path)
        }
    }

    pub fn script_path(&self) -> PathBuf {
        self.resolve(&self.export.script)
    }

    pub fn log_path(&self) -> PathBuf {
        self.resolve(&self.log.file)
    }

    pub fn output_path(&self, file: &WatchedFile) -> Option<PathBuf> {
        file.output.as_deref().map(|p| self.resolve(p))
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.poll.interval_secs)
    }

    pub fn error_interval(&self) -> Duration {
        Duration::from_secs(self.poll.error_interval_secs)
    }

    pub fn push_retry_delay(&self) -> Duration {
        Duration::from_secs(self.publish.push_retry_delay_secs)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
