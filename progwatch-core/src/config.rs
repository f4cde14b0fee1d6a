//! Watcher configuration file.
//!
//! # Storage layout
//!
//! ```text
//! ~/.progwatch/
//!   config.yaml     (default location, overridable with --config)
//! ```
//!
//! # API pattern
//!
//! Functions that need the home directory come in two forms:
//! - `fn_at(home: &Path, …)`: explicit home; used in tests with `TempDir`
//! - `fn(…)`: derives home from `dirs::home_dir()`, delegates to `_at`

use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};

use crate::error::{invalid, ConfigError};
use crate::types::{ClassCode, WatchedFile, WatcherConfig};

pub const CONFIG_FILE: &str = "config.yaml";

// ---------------------------------------------------------------------------
// 1. Path helpers
// ---------------------------------------------------------------------------

/// `<home>/.progwatch/`
pub fn progwatch_root(home: &Path) -> PathBuf {
    home.join(".progwatch")
}

/// `<home>/.progwatch/config.yaml` (pure, no I/O).
pub fn default_config_path_at(home: &Path) -> PathBuf {
    progwatch_root(home).join(CONFIG_FILE)
}

/// `default_config_path_at` convenience wrapper.
pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    Ok(default_config_path_at(&home()?))
}

// ---------------------------------------------------------------------------
// 2. Load + validate
// ---------------------------------------------------------------------------

/// Load and validate the config at `path`.
///
/// Returns `ConfigError::NotFound` if absent, `ConfigError::Parse` (with path
/// and line context) if malformed, `ConfigError::Invalid` if a field fails
/// validation.
pub fn load(path: &Path) -> Result<WatcherConfig, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound {
            path: path.to_path_buf(),
        });
    }
    let contents = std::fs::read_to_string(path)?;
    let config: WatcherConfig = serde_yaml::from_str(&contents).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        source: e,
    })?;
    validate(&config)?;
    Ok(config)
}

/// Check every structural requirement once, at startup.
///
/// A watched source file that does not exist yet is fine; it is polled as
/// absent until it appears.
pub fn validate(config: &WatcherConfig) -> Result<(), ConfigError> {
    if config.repo.as_os_str().is_empty() {
        return Err(invalid("repo", "must not be empty"));
    }
    if !config.repo.is_dir() {
        return Err(invalid(
            "repo",
            format!("{} is not an existing directory", config.repo.display()),
        ));
    }

    if config.poll.interval_secs == 0 {
        return Err(invalid("poll.interval_secs", "must be greater than 0"));
    }
    if config.poll.error_interval_secs == 0 {
        return Err(invalid("poll.error_interval_secs", "must be greater than 0"));
    }
    if config.poll.stabilize_window == 0 {
        return Err(invalid("poll.stabilize_window", "must be at least 1"));
    }

    if config.export.script.as_os_str().is_empty() {
        return Err(invalid("export.script", "must not be empty"));
    }
    check_inside_repo("export.script", &config.export.script)?;
    if config.export.fallback_interpreter.trim().is_empty() {
        return Err(invalid("export.fallback_interpreter", "must not be empty"));
    }
    if let Some(interpreter) = &config.export.interpreter {
        if interpreter.as_os_str().is_empty() {
            return Err(invalid("export.interpreter", "must not be empty when set"));
        }
    }

    if config.publish.enabled {
        if config.publish.git.trim().is_empty() {
            return Err(invalid("publish.git", "must not be empty"));
        }
        if config.publish.paths.is_empty() {
            return Err(invalid(
                "publish.paths",
                "at least one path is required when publishing is enabled",
            ));
        }
    }
    for (idx, path) in config.publish.paths.iter().enumerate() {
        let field = format!("publish.paths[{idx}]");
        if path.as_os_str().is_empty() {
            return Err(invalid(field, "must not be empty"));
        }
        if path.is_absolute() {
            return Err(invalid(field, "must be relative to the repo"));
        }
        check_inside_repo(&field, path)?;
    }

    if config.log.file.as_os_str().is_empty() {
        return Err(invalid("log.file", "must not be empty"));
    }
    check_inside_repo("log.file", &config.log.file)?;

    validate_files(&config.files)
}

fn validate_files(files: &[WatchedFile]) -> Result<(), ConfigError> {
    if files.is_empty() {
        return Err(invalid("files", "at least one watched file is required"));
    }
    let mut seen: HashSet<&ClassCode> = HashSet::new();
    for (idx, file) in files.iter().enumerate() {
        if file.class.0.trim().is_empty() {
            return Err(invalid(format!("files[{idx}].class"), "must not be empty"));
        }
        if !seen.insert(&file.class) {
            return Err(invalid(
                format!("files[{idx}].class"),
                format!("duplicate class code '{}'", file.class),
            ));
        }
        if file.source.as_os_str().is_empty() {
            return Err(invalid(format!("files[{idx}].source"), "must not be empty"));
        }
        if let Some(output) = &file.output {
            check_inside_repo(&format!("files[{idx}].output"), output)?;
        }
    }
    Ok(())
}

/// Relative paths are joined onto the repo; they may not climb out of it.
fn check_inside_repo(field: &str, path: &Path) -> Result<(), ConfigError> {
    if path.is_relative() && path.components().any(|c| matches!(c, Component::ParentDir)) {
        return Err(invalid(
            field,
            format!("{} escapes the repo with '..'", path.display()),
        ));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// 3. Save (atomic) + init
// ---------------------------------------------------------------------------

/// Atomically write `config` to `path`.
///
/// Write flow: serialize → `.yaml.tmp` sibling → `rename`.
pub fn save(path: &Path, config: &WatcherConfig) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| CONFIG_FILE.to_string());
    let tmp_path = path.with_file_name(format!("{file_name}.tmp"));

    let yaml = serde_yaml::to_string(config)?;
    std::fs::write(&tmp_path, yaml)?;
    std::fs::rename(&tmp_path, path)?;
    Ok(())
}

/// Starter configuration with one example class, written by `progwatch init`.
pub fn starter(repo: PathBuf) -> WatcherConfig {
    let mut config = WatcherConfig::new(repo.clone());
    config.files.push(WatchedFile {
        class: ClassCode::from("302"),
        source: repo.join("302_Progression.ods"),
        output: Some(PathBuf::from("docs/progressions/College/302.html")),
    });
    config
}

/// Write a starter config to `path`.
///
/// Refuses to overwrite an existing file unless `force` is set.
pub fn init_at(path: &Path, repo: PathBuf, force: bool) -> Result<WatcherConfig, ConfigError> {
    if path.exists() && !force {
        return Err(ConfigError::AlreadyExists {
            path: path.to_path_buf(),
        });
    }
    let config = starter(repo);
    save(path, &config)?;
    Ok(config)
}

// ---------------------------------------------------------------------------
// 4. Internal helpers
// ---------------------------------------------------------------------------

fn home() -> Result<PathBuf, ConfigError> {
    dirs::home_dir().ok_or(ConfigError::HomeNotFound)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
