//! `progwatch init --repo <path> [--force]`

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use progwatch_core::config;

use crate::GlobalArgs;

/// Write a starter config pointing at a site repository.
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Site repository root: export working directory and git checkout.
    #[arg(long)]
    pub repo: PathBuf,

    /// Overwrite an existing config.
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    pub fn run(self, global: &GlobalArgs) -> Result<()> {
        let repo = self
            .repo
            .canonicalize()
            .with_context(|| format!("cannot resolve repo '{}'", self.repo.display()))?;
        let path = global.config_path()?;

        let cfg = config::init_at(&path, repo, self.force)
            .with_context(|| format!("failed to write config to {}", path.display()))?;

        println!("✓ Wrote starter config to {}", path.display());
        println!("  repo: {}", cfg.repo.display());
        println!(
            "  {} example file(s); edit `files:` to list your spreadsheets",
            cfg.files.len()
        );
        Ok(())
    }
}
