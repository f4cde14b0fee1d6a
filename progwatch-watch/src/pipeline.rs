//! One publish cycle (export → touch outputs → git publish), shared by the
//! watch loop and `progwatch publish`.
//!
//! Each step is isolated: a failing step is logged and the next one still
//! runs, so a cycle always completes with a [`CycleSummary`].

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Local};
use filetime::FileTime;
use serde::Serialize;

use progwatch_core::{ClassCode, WatcherConfig};

use crate::activity_log::{render_chain, ActivityLog};
use crate::error::format_code;
use crate::export::ExportInvoker;
use crate::launcher::ProcessLauncher;
use crate::publish::{PublishInvoker, PublishOutcome};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ExportStatus {
    Skipped,
    Finished { code: Option<i32> },
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PublishStatus {
    Disabled,
    Completed { result: PublishOutcome },
    Failed { error: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct CycleSummary {
    pub started_at: DateTime<Local>,
    pub classes: Vec<ClassCode>,
    pub export: ExportStatus,
    /// Output pages whose mtime was refreshed.
    pub touched: Vec<PathBuf>,
    pub publish: PublishStatus,
    pub duration_ms: u128,
}

pub struct Pipeline {
    config: WatcherConfig,
    export: ExportInvoker,
    publish: PublishInvoker,
    log: ActivityLog,
}

impl Pipeline {
    pub fn new(config: WatcherConfig, launcher: Arc<dyn ProcessLauncher>) -> Self {
        Self {
            export: ExportInvoker::from_config(&config, launcher.clone()),
            publish: PublishInvoker::from_config(&config, launcher),
            log: ActivityLog::from_config(&config),
            config,
        }
    }

    pub fn config(&self) -> &WatcherConfig {
        &self.config
    }

    pub fn log(&self) -> &ActivityLog {
        &self.log
    }

    pub fn run(&self, classes: &[ClassCode], skip_export: bool) -> CycleSummary {
        self.run_at(classes, skip_export, Local::now())
    }

    /// Run a cycle for `classes` with `now` as the commit timestamp.
    pub fn run_at(
        &self,
        classes: &[ClassCode],
        skip_export: bool,
        now: DateTime<Local>,
    ) -> CycleSummary {
        let started = Instant::now();
        let export = self.run_export(skip_export);
        let touched = self.touch_outputs(classes);
        let publish = self.run_publish(now);

        CycleSummary {
            started_at: now,
            classes: classes.to_vec(),
            export,
            touched,
            publish,
            duration_ms: started.elapsed().as_millis(),
        }
    }

    fn run_export(&self, skip: bool) -> ExportStatus {
        if skip {
            self.log.info("export skipped");
            return ExportStatus::Skipped;
        }
        match self.export.run() {
            Ok(code) => {
                self.log
                    .info(&format!("export finished (code={})", format_code(code)));
                ExportStatus::Finished { code }
            }
            Err(err) => {
                self.log.error_chain("exception during export", &err);
                ExportStatus::Failed {
                    error: render_chain(&err),
                }
            }
        }
    }

    /// Refresh the mtime of each class's output page that exists.
    fn touch_outputs(&self, classes: &[ClassCode]) -> Vec<PathBuf> {
        let mut touched = Vec::new();
        for file in self.config.files.iter().filter(|f| classes.contains(&f.class)) {
            let Some(output) = self.config.output_path(file) else {
                continue;
            };
            if !output.exists() {
                continue;
            }
            match filetime::set_file_mtime(&output, FileTime::now()) {
                Ok(()) => touched.push(output),
                Err(err) => self.log.warn(&format!(
                    "could not touch {} for {}: {err}",
                    output.display(),
                    file.class
                )),
            }
        }
        touched
    }

    fn run_publish(&self, now: DateTime<Local>) -> PublishStatus {
        if !self.config.publish.enabled {
            self.log.info("publishing disabled, skipping git");
            return PublishStatus::Disabled;
        }
        match self.publish.publish(now.naive_local()) {
            Ok(result) => {
                match &result {
                    PublishOutcome::NothingToPublish => self.log.info("nothing to publish"),
                    PublishOutcome::Pushed { attempts: 1, .. } => self.log.info("git push done"),
                    PublishOutcome::Pushed { attempts, .. } => self
                        .log
                        .info(&format!("git push done after {attempts} attempts")),
                    PublishOutcome::PushFailed { attempts, code, .. } => self.log.warn(&format!(
                        "git push failed (code={}) after {attempts} attempt(s); commit kept locally",
                        format_code(*code)
                    )),
                }
                PublishStatus::Completed { result }
            }
            Err(err) => {
                self.log.error_chain("git", &err);
                PublishStatus::Failed {
                    error: render_chain(&err),
                }
            }
        }
    }
}
