//! `hashsync diff` — show what a deploy would change, without changing it.

use anyhow::{Context, Result};
use clap::Args;

use hashsync_ftp::FtpsConnector;
use hashsync_sync::pipeline::{self, RunOptions};

use super::config::ConfigArgs;
use super::report::print_changes;

/// Arguments for `hashsync diff`.
#[derive(Args, Debug)]
pub struct DiffArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

impl DiffArgs {
    pub fn run(self) -> Result<()> {
        let config = self.config.resolve()?;
        let outcome = pipeline::run(
            &config,
            &FtpsConnector,
            RunOptions { dry_run: true },
            |_| false,
        )
        .context("diff failed")?;

        let changes = outcome.into_changes();

        if self.json {
            println!("{}", serde_json::to_string_pretty(&changes)?);
        } else if changes.is_empty() {
            println!("No changes detected. Nothing to deploy.");
        } else {
            print_changes(&changes);
        }
        Ok(())
    }
}
