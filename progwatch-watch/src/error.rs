use std::path::PathBuf;

use thiserror::Error;

/// Error surface for the watcher runtime, invokers, and activity log.
///
/// Messages leave the underlying cause to the `source()` chain so the
/// activity log can render every level on its own line.
#[derive(Debug, Error)]
pub enum WatchError {
    #[error("I/O error at {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to launch `{program}`")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("git {step} exited with code {code}: {stderr}")]
    Git {
        step: &'static str,
        code: String,
        stderr: String,
    },

    #[error("poll tick panicked: {0}")]
    Panic(String),

    #[error("runtime error: {0}")]
    Runtime(String),
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> WatchError {
    WatchError::Io {
        path: path.into(),
        source,
    }
}

/// Render an exit code the way the activity log shows it (`none` when the
/// process was killed by a signal).
pub fn format_code(code: Option<i32>) -> String {
    code.map(|c| c.to_string())
        .unwrap_or_else(|| "none".to_string())
}
