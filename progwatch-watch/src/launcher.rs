//! Subprocess boundary shared by the export and publish invokers.
//!
//! Every external call goes through [`ProcessLauncher`] so the host-specific
//! "no console window" behaviour is configured once, on the launcher, instead
//! of at each call site.

use std::ffi::OsString;
use std::fmt;
use std::io;
use std::path::PathBuf;
use std::process::{Command, Stdio};

/// A fully resolved command line plus its working directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: PathBuf,
    pub args: Vec<OsString>,
    pub cwd: PathBuf,
}

impl CommandSpec {
    pub fn new(program: impl Into<PathBuf>, cwd: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: cwd.into(),
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Arguments as lossy UTF-8, for logs and assertions.
    pub fn args_lossy(&self) -> Vec<String> {
        self.args
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}

/// Captured result of a finished process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Exit code; `None` when the process was terminated by a signal.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Runs external programs. Implementations block until the process exits.
pub trait ProcessLauncher: Send + Sync {
    /// Run with inherited stdout/stderr and return the exit code.
    fn status(&self, spec: &CommandSpec) -> io::Result<Option<i32>>;

    /// Run with captured stdout/stderr.
    fn output(&self, spec: &CommandSpec) -> io::Result<ProcessOutput>;
}

#[cfg(windows)]
const CREATE_NO_WINDOW: u32 = 0x0800_0000;

/// [`ProcessLauncher`] backed by `std::process::Command`.
#[derive(Debug, Clone, Copy)]
pub struct SystemLauncher {
    suppress_window: bool,
}

impl SystemLauncher {
    pub fn new(suppress_window: bool) -> Self {
        Self { suppress_window }
    }

    fn command(&self, spec: &CommandSpec) -> Command {
        let mut cmd = Command::new(&spec.program);
        cmd.args(&spec.args).current_dir(&spec.cwd);
        if self.suppress_window {
            #[cfg(windows)]
            {
                use std::os::windows::process::CommandExt;
                cmd.creation_flags(CREATE_NO_WINDOW);
            }
            // Headless: a child must never wait on a terminal.
            cmd.stdin(Stdio::null());
        }
        cmd
    }
}

impl ProcessLauncher for SystemLauncher {
    fn status(&self, spec: &CommandSpec) -> io::Result<Option<i32>> {
        let status = self.command(spec).status()?;
        Ok(status.code())
    }

    fn output(&self, spec: &CommandSpec) -> io::Result<ProcessOutput> {
        let output = self.command(spec).output()?;
        Ok(ProcessOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
