//! Export invoker: runs the spreadsheet → HTML/Markdown renderer.

use std::path::PathBuf;
use std::sync::Arc;

use progwatch_core::WatcherConfig;

use crate::error::WatchError;
use crate::launcher::{CommandSpec, ProcessLauncher};

pub struct ExportInvoker {
    launcher: Arc<dyn ProcessLauncher>,
    interpreter: Option<PathBuf>,
    fallback_interpreter: String,
    script: PathBuf,
    args: Vec<String>,
    repo: PathBuf,
}

impl ExportInvoker {
    pub fn from_config(config: &WatcherConfig, launcher: Arc<dyn ProcessLauncher>) -> Self {
        Self {
            launcher,
            interpreter: config.export.interpreter.clone(),
            fallback_interpreter: config.export.fallback_interpreter.clone(),
            script: config.script_path(),
            args: config.export.args.clone(),
            repo: config.repo.clone(),
        }
    }

    /// The preferred interpreter when its binary exists, else the fallback
    /// name resolved through `PATH`.
    pub fn interpreter(&self) -> PathBuf {
        match &self.interpreter {
            Some(preferred) if preferred.exists() => preferred.clone(),
            _ => PathBuf::from(&self.fallback_interpreter),
        }
    }

    pub fn command(&self) -> CommandSpec {
        CommandSpec::new(self.interpreter(), &self.repo)
            .arg(&self.script)
            .args(&self.args)
    }

    /// Run the export and return its exit code. The code is not interpreted:
    /// the renderer decides what a failure means and logs it itself.
    pub fn run(&self) -> Result<Option<i32>, WatchError> {
        let spec = self.command();
        tracing::debug!(command = %spec, "starting export");
        self.launcher
            .status(&spec)
            .map_err(|source| WatchError::Launch {
                program: spec.to_string(),
                source,
            })
    }
}
