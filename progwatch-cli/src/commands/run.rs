//! `progwatch run [--max-cycles N]`

use anyhow::{Context, Result};
use clap::Args;

use progwatch_watch::start_blocking;

use crate::GlobalArgs;

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Stop after this many polls instead of running until Ctrl-C.
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u64).range(1..))]
    pub max_cycles: Option<u64>,
}

impl RunArgs {
    pub fn run(self, global: &GlobalArgs) -> Result<()> {
        let config = global.load()?;
        start_blocking(config, self.max_cycles).context("watcher exited with error")
    }
}
