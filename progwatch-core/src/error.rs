//! Error types for progwatch-core.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise while loading, validating or saving a configuration.
///
/// Wrapped causes are exposed through `source()` only, never repeated in
/// the message.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Underlying I/O failure (permission denied, unreadable file, etc.).
    #[error("I/O error")]
    Io(#[from] std::io::Error),

    /// YAML serialization error (write/save path).
    #[error("YAML serialization error")]
    Yaml(#[from] serde_yaml::Error),

    /// YAML parse error on load; serde_yaml's line context is in the source.
    #[error("failed to parse config at {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// `dirs::home_dir()` returned `None`, so we cannot locate `~/.progwatch/`.
    #[error("cannot determine home directory; set $HOME or equivalent")]
    HomeNotFound,

    /// The config file did not exist at the expected path.
    #[error("config not found at {path}")]
    NotFound { path: PathBuf },

    /// `init` refused to overwrite an existing config file.
    #[error("config already exists at {path} (use --force to overwrite)")]
    AlreadyExists { path: PathBuf },

    /// A field is structurally invalid; reported once at startup.
    #[error("invalid config field `{field}`: {reason}")]
    Invalid { field: String, reason: String },
}

pub(crate) fn invalid(field: impl Into<String>, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field: field.into(),
        reason: reason.into(),
    }
}
