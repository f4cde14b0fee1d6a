//! `progwatch publish [--skip-export] [--json]`

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;

use progwatch_core::ClassCode;
use progwatch_watch::{
    format_code, init_tracing, CycleSummary, ExportStatus, Pipeline, PublishOutcome,
    PublishStatus, SystemLauncher,
};

use crate::GlobalArgs;

/// Run one cycle for every watched class without waiting for a change.
#[derive(Args, Debug)]
pub struct PublishArgs {
    /// Publish what is already generated; do not run the export.
    #[arg(long)]
    pub skip_export: bool,

    /// Emit the cycle summary as JSON.
    #[arg(long)]
    pub json: bool,
}

impl PublishArgs {
    pub fn run(self, global: &GlobalArgs) -> Result<()> {
        init_tracing();
        let config = global.load()?;
        let classes: Vec<ClassCode> = config.files.iter().map(|f| f.class.clone()).collect();
        let launcher = Arc::new(SystemLauncher::new(config.suppress_window));
        let pipeline = Pipeline::new(config, launcher);

        let summary = pipeline.run(&classes, self.skip_export);
        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&summary)
                    .context("failed to serialize cycle summary")?
            );
        } else {
            print_summary(&summary);
        }

        if let PublishStatus::Failed { error } = &summary.publish {
            bail!("publish failed: {error}");
        }
        Ok(())
    }
}

fn print_summary(summary: &CycleSummary) {
    let export = match &summary.export {
        ExportStatus::Skipped => "skipped".bright_black().to_string(),
        ExportStatus::Finished { code: Some(0) } => "ok".green().to_string(),
        ExportStatus::Finished { code } => format!("exit code {}", format_code(*code))
            .yellow()
            .to_string(),
        ExportStatus::Failed { error } => format!("failed: {error}").red().to_string(),
    };
    let publish = match &summary.publish {
        PublishStatus::Disabled => "disabled".bright_black().to_string(),
        PublishStatus::Completed {
            result: PublishOutcome::NothingToPublish,
        } => "nothing to publish".to_string(),
        PublishStatus::Completed {
            result: PublishOutcome::Pushed { message, .. },
        } => format!("pushed \"{message}\"").green().to_string(),
        PublishStatus::Completed {
            result: PublishOutcome::PushFailed { attempts, code, .. },
        } => format!(
            "push failed (code={}) after {attempts} attempt(s)",
            format_code(*code)
        )
        .yellow()
        .to_string(),
        PublishStatus::Failed { error } => format!("failed: {error}").red().to_string(),
    };

    let classes: Vec<String> = summary.classes.iter().map(ToString::to_string).collect();
    println!("classes: [{}]", classes.join(", "));
    println!("export:  {export}");
    println!("touched: {}", summary.touched.len());
    println!("publish: {publish}");
    println!("took {} ms", summary.duration_ms);
}
