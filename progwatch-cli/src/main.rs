//! progwatch: watch progression spreadsheets and publish the generated site.
//!
//! # Usage
//!
//! ```text
//! progwatch run [--max-cycles N]
//! progwatch check [--json]
//! progwatch publish [--skip-export] [--json]
//! progwatch init --repo <path> [--force]
//! progwatch logs [--lines N]
//! ```
//!
//! Every command accepts `--config <path>` (default `~/.progwatch/config.yaml`).

mod commands;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};

use commands::{
    check::CheckArgs, init::InitArgs, logs::LogsArgs, publish::PublishArgs, run::RunArgs,
};
use progwatch_core::{config, WatcherConfig};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "progwatch",
    version,
    about = "Watch progression spreadsheets, re-export them and publish with git",
    long_about = None,
)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

/// Options shared by every subcommand.
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Path to the watcher config file.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

impl GlobalArgs {
    pub fn config_path(&self) -> Result<PathBuf> {
        match &self.config {
            Some(path) => Ok(path.clone()),
            None => config::default_config_path().context("could not locate default config"),
        }
    }

    pub fn load(&self) -> Result<WatcherConfig> {
        let path = self.config_path()?;
        config::load(&path).with_context(|| {
            format!(
                "failed to load config from {}; run `progwatch init` first",
                path.display()
            )
        })
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the watcher in the foreground.
    Run(RunArgs),

    /// Validate the config and show every watched file.
    Check(CheckArgs),

    /// Export, touch and publish once, right now.
    Publish(PublishArgs),

    /// Write a starter config.
    Init(InitArgs),

    /// Print the tail of the activity log.
    Logs(LogsArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Run(args) => args.run(&cli.global),
        Commands::Check(args) => args.run(&cli.global),
        Commands::Publish(args) => args.run(&cli.global),
        Commands::Init(args) => args.run(&cli.global),
        Commands::Logs(args) => args.run(&cli.global),
    }
}
