//! `progwatch check`: config validation and per-file visibility.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use progwatch_core::WatcherConfig;
use progwatch_watch::{signature, Signature};

use crate::GlobalArgs;

/// Arguments for `progwatch check`.
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

impl CheckArgs {
    pub fn run(self, global: &GlobalArgs) -> Result<()> {
        let path = global.config_path()?;
        let config = global.load()?;
        let files = inspect(&config);

        if self.json {
            let payload = CheckReportJson {
                config: path.display().to_string(),
                repo: config.repo.display().to_string(),
                interval_secs: config.poll.interval_secs,
                stabilize_window: config.poll.stabilize_window,
                publish_enabled: config.publish.enabled,
                files,
            };
            println!(
                "{}",
                serde_json::to_string_pretty(&payload).context("failed to serialize check JSON")?
            );
            return Ok(());
        }

        print_table(&path, &config, files);
        Ok(())
    }
}

#[derive(Serialize)]
struct CheckReportJson {
    config: String,
    repo: String,
    interval_secs: u64,
    stabilize_window: u32,
    publish_enabled: bool,
    files: Vec<FileStatus>,
}

#[derive(Debug, Serialize)]
struct FileStatus {
    class: String,
    source: String,
    signature: Option<Signature>,
    /// Set when the source could not be stat'ed.
    error: Option<String>,
    output: Option<String>,
    output_exists: bool,
}

#[derive(Tabled)]
struct FileTableRow {
    #[tabled(rename = "class")]
    class: String,
    #[tabled(rename = "state")]
    state: String,
    #[tabled(rename = "modified")]
    modified: String,
    #[tabled(rename = "size")]
    size: String,
    #[tabled(rename = "output")]
    output: String,
}

fn inspect(config: &WatcherConfig) -> Vec<FileStatus> {
    config
        .files
        .iter()
        .map(|file| {
            let (signature, error) = match signature::read(&file.source) {
                Ok(sig) => (Some(sig), None),
                Err(err) => (None, Some(err.to_string())),
            };
            let output = config.output_path(file);
            FileStatus {
                class: file.class.to_string(),
                source: file.source.display().to_string(),
                signature,
                error,
                output_exists: output.as_deref().is_some_and(Path::exists),
                output: output.map(|p| p.display().to_string()),
            }
        })
        .collect()
}

fn print_table(path: &Path, config: &WatcherConfig, files: Vec<FileStatus>) {
    let present = files
        .iter()
        .filter(|f| matches!(f.signature, Some(Signature::Present { .. })))
        .count();
    println!(
        "progwatch v{} | {} | {} files ({} present) | poll {}s x {} | publish {}",
        env!("CARGO_PKG_VERSION"),
        path.display(),
        files.len(),
        present,
        config.poll.interval_secs,
        config.poll.stabilize_window,
        if config.publish.enabled {
            "on".green().bold()
        } else {
            "off".yellow().bold()
        },
    );
    println!("repo: {}", config.repo.display());

    if files.is_empty() {
        println!("No files watched.");
        return;
    }

    let rows: Vec<FileTableRow> = files
        .iter()
        .map(|file| {
            let (state, modified, size) = match (&file.signature, &file.error) {
                (Some(Signature::Present { mtime, size }), _) => {
                    ("PRESENT".to_string(), format_mtime(*mtime), size.to_string())
                }
                (Some(Signature::Absent), _) => {
                    ("ABSENT".to_string(), "-".to_string(), "-".to_string())
                }
                (None, error) => (
                    "ERROR".to_string(),
                    error.clone().unwrap_or_default(),
                    "-".to_string(),
                ),
            };
            let output = match &file.output {
                Some(out) if file.output_exists => out.clone(),
                Some(out) => format!("{out} (missing)"),
                None => "-".to_string(),
            };
            FileTableRow {
                class: file.class.clone(),
                state,
                modified,
                size,
                output,
            }
        })
        .collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");

    for file in files.iter().filter(|f| f.signature.is_none()) {
        println!(
            "{} {}: {}",
            "warning:".yellow().bold(),
            file.source,
            file.error.as_deref().unwrap_or("unreadable")
        );
    }
}

fn format_mtime(mtime: i64) -> String {
    DateTime::from_timestamp(mtime, 0)
        .map(|at| {
            at.with_timezone(&Local)
                .format("%Y-%m-%d %H:%M:%S")
                .to_string()
        })
        .unwrap_or_else(|| mtime.to_string())
}
