//! Publish invoker: `git add` → `git status --porcelain` → commit + push.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDateTime;
use serde::Serialize;

use progwatch_core::WatcherConfig;

use crate::error::{format_code, WatchError};
use crate::launcher::{CommandSpec, ProcessLauncher, ProcessOutput};

/// What a publish attempt ended with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PublishOutcome {
    /// Porcelain status was empty; no commit, no push.
    NothingToPublish,
    Pushed {
        message: String,
        attempts: u32,
    },
    /// Every push attempt exited non-zero. The commit stays local and goes
    /// out with the next successful push.
    PushFailed {
        message: String,
        attempts: u32,
        code: Option<i32>,
    },
}

pub struct PublishInvoker {
    launcher: Arc<dyn ProcessLauncher>,
    git: PathBuf,
    repo: PathBuf,
    paths: Vec<PathBuf>,
    message_prefix: String,
    push_retries: u32,
    retry_delay: Duration,
}

/// `"<prefix> (YYYY-MM-DD HH:MM)"`.
pub fn commit_message(prefix: &str, now: NaiveDateTime) -> String {
    format!("{prefix} ({})", now.format("%Y-%m-%d %H:%M"))
}

impl PublishInvoker {
    pub fn from_config(config: &WatcherConfig, launcher: Arc<dyn ProcessLauncher>) -> Self {
        Self {
            launcher,
            git: PathBuf::from(&config.publish.git),
            repo: config.repo.clone(),
            paths: config.publish.paths.clone(),
            message_prefix: config.publish.message_prefix.clone(),
            push_retries: config.publish.push_retries,
            retry_delay: config.push_retry_delay(),
        }
    }

    /// Stage, check for pending changes, commit and push.
    ///
    /// Non-zero exits of `add` and `commit` are logged and tolerated, as
    /// in an unattended run a later cycle picks the changes up. A failing
    /// `status` is an error: without it there is no way to tell whether
    /// anything is pending.
    pub fn publish(&self, now: NaiveDateTime) -> Result<PublishOutcome, WatchError> {
        let add = self.git_cmd().arg("add").args(&self.paths);
        let code = self.status(&add)?;
        if code != Some(0) {
            tracing::warn!(code = %format_code(code), "git add exited non-zero");
        }

        let status = self.output(&self.git_cmd().args(["status", "--porcelain"]))?;
        if !status.success() {
            return Err(WatchError::Git {
                step: "status",
                code: format_code(status.code),
                stderr: status.stderr.trim().to_string(),
            });
        }
        if status.stdout.trim().is_empty() {
            return Ok(PublishOutcome::NothingToPublish);
        }

        let message = commit_message(&self.message_prefix, now);
        let commit = self.git_cmd().args(["commit", "-m"]).arg(&message);
        let code = self.status(&commit)?;
        if code != Some(0) {
            tracing::warn!(code = %format_code(code), "git commit exited non-zero");
        }

        self.push(message)
    }

    /// One push plus at most `push_retries` more, `retry_delay` apart, so the
    /// total wait stays bounded.
    fn push(&self, message: String) -> Result<PublishOutcome, WatchError> {
        let push = self.git_cmd().arg("push");
        let max_attempts = self.push_retries.saturating_add(1);
        let mut attempts = 0;
        loop {
            attempts += 1;
            let code = self.status(&push)?;
            if code == Some(0) {
                return Ok(PublishOutcome::Pushed { message, attempts });
            }
            if attempts >= max_attempts {
                return Ok(PublishOutcome::PushFailed {
                    message,
                    attempts,
                    code,
                });
            }
            tracing::warn!(
                code = %format_code(code),
                attempt = attempts,
                max_attempts,
                "git push failed, retrying"
            );
            std::thread::sleep(self.retry_delay);
        }
    }

    fn git_cmd(&self) -> CommandSpec {
        CommandSpec::new(&self.git, &self.repo)
    }

    fn status(&self, spec: &CommandSpec) -> Result<Option<i32>, WatchError> {
        self.launcher.status(spec).map_err(|source| launch_err(spec, source))
    }

    fn output(&self, spec: &CommandSpec) -> Result<ProcessOutput, WatchError> {
        self.launcher.output(spec).map_err(|source| launch_err(spec, source))
    }
}

fn launch_err(spec: &CommandSpec, source: std::io::Error) -> WatchError {
    WatchError::Launch {
        program: spec.to_string(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::sync::atomic::{AtomicU32, Ordering};

    use chrono::NaiveDate;
    use progwatch_core::config::starter;
    use tempfile::TempDir;

    use super::*;
    use crate::launcher::testing::RecordingLauncher;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 10, 29)
            .unwrap()
            .and_hms_opt(18, 42, 57)
            .unwrap()
    }

    fn invoker(repo: &TempDir, launcher: Arc<RecordingLauncher>) -> PublishInvoker {
        PublishInvoker::from_config(&starter(repo.path().to_path_buf()), launcher)
    }

    #[test]
    fn commit_message_has_minute_precision() {
        assert_eq!(commit_message("MAJ auto", now()), "MAJ auto (2025-10-29 18:42)");
    }

    #[test]
    fn empty_status_skips_commit_and_push() {
        let repo = TempDir::new().unwrap();
        let launcher = Arc::new(RecordingLauncher::with_status(""));
        let outcome = invoker(&repo, launcher.clone()).publish(now()).unwrap();

        assert_eq!(outcome, PublishOutcome::NothingToPublish);
        assert_eq!(launcher.verbs(), vec!["add", "status"]);
        let add = &launcher.calls()[0];
        assert_eq!(add.program, PathBuf::from("git"));
        assert_eq!(add.cwd, repo.path());
        assert_eq!(
            add.args_lossy(),
            vec!["add", "docs/progressions", "docs/assets"]
        );
    }

    #[test]
    fn whitespace_only_status_counts_as_empty() {
        let repo = TempDir::new().unwrap();
        let launcher = Arc::new(RecordingLauncher::with_status("\n  \n"));
        let outcome = invoker(&repo, launcher.clone()).publish(now()).unwrap();
        assert_eq!(outcome, PublishOutcome::NothingToPublish);
    }

    #[test]
    fn pending_changes_commit_once_and_push_once() {
        let repo = TempDir::new().unwrap();
        let launcher = Arc::new(RecordingLauncher::with_status(
            " M docs/progressions/College/302.html\n",
        ));
        let outcome = invoker(&repo, launcher.clone()).publish(now()).unwrap();

        assert_eq!(
            outcome,
            PublishOutcome::Pushed {
                message: "MAJ auto (2025-10-29 18:42)".to_string(),
                attempts: 1,
            }
        );
        assert_eq!(launcher.verbs(), vec!["add", "status", "commit", "push"]);
        let commit = &launcher.calls()[2];
        assert_eq!(
            commit.args_lossy(),
            vec!["commit", "-m", "MAJ auto (2025-10-29 18:42)"]
        );
    }

    #[test]
    fn failed_status_is_an_error_and_skips_commit() {
        let repo = TempDir::new().unwrap();
        let launcher = Arc::new(RecordingLauncher::new(|spec| {
            let failing = spec.args_lossy()[0] == "status";
            Ok(ProcessOutput {
                code: Some(if failing { 128 } else { 0 }),
                stdout: String::new(),
                stderr: if failing {
                    "fatal: not a git repository".to_string()
                } else {
                    String::new()
                },
            })
        }));
        let err = invoker(&repo, launcher.clone()).publish(now()).unwrap_err();
        assert!(err.to_string().contains("git status exited with code 128"), "got: {err}");
        assert_eq!(launcher.verbs(), vec!["add", "status"]);
    }

    #[test]
    fn push_is_retried_within_bound() {
        let repo = TempDir::new().unwrap();
        let pushes = Arc::new(AtomicU32::new(0));
        let counter = pushes.clone();
        let launcher = Arc::new(RecordingLauncher::new(move |spec| {
            let verb = spec.args_lossy()[0].clone();
            let code = if verb == "push" {
                // First push is rejected, the retry goes through.
                if counter.fetch_add(1, Ordering::SeqCst) == 0 { 1 } else { 0 }
            } else {
                0
            };
            let stdout = if verb == "status" { "?? docs/assets/pj/302/fiche.pdf\n" } else { "" };
            Ok(ProcessOutput {
                code: Some(code),
                stdout: stdout.to_string(),
                stderr: String::new(),
            })
        }));
        let mut cfg = starter(repo.path().to_path_buf());
        cfg.publish.push_retries = 2;
        cfg.publish.push_retry_delay_secs = 0;
        let outcome = PublishInvoker::from_config(&cfg, launcher.clone())
            .publish(now())
            .unwrap();

        assert!(matches!(outcome, PublishOutcome::Pushed { attempts: 2, .. }), "got: {outcome:?}");
        assert_eq!(pushes.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn push_failure_without_retries_is_reported_not_raised() {
        let repo = TempDir::new().unwrap();
        let launcher = Arc::new(RecordingLauncher::new(|spec| {
            let verb = spec.args_lossy()[0].clone();
            Ok(ProcessOutput {
                code: Some(if verb == "push" { 1 } else { 0 }),
                stdout: if verb == "status" { " M a\n".to_string() } else { String::new() },
                stderr: String::new(),
            })
        }));
        let outcome = invoker(&repo, launcher.clone()).publish(now()).unwrap();
        assert!(matches!(
            outcome,
            PublishOutcome::PushFailed { attempts: 1, code: Some(1), .. }
        ));
        assert_eq!(launcher.verbs().iter().filter(|v| *v == "push").count(), 1);
    }

    #[test]
    fn missing_git_binary_is_a_launch_error() {
        let repo = TempDir::new().unwrap();
        let launcher = Arc::new(RecordingLauncher::new(|_| {
            Err(io::Error::new(io::ErrorKind::NotFound, "git not found"))
        }));
        let err = invoker(&repo, launcher).publish(now()).unwrap_err();
        assert!(matches!(err, WatchError::Launch { .. }), "got: {err}");
    }
}
