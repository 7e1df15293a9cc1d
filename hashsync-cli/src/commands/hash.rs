//! `hashsync hash` — print the local manifest.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use hashsync_sync::{manifest, pipeline};

use super::config::ConfigArgs;

/// Arguments for `hashsync hash`.
#[derive(Args, Debug)]
pub struct HashArgs {
    /// Directory to hash; overrides `--local-dir`.
    #[arg(value_name = "DIR")]
    pub dir: Option<PathBuf>,

    #[command(flatten)]
    pub config: ConfigArgs,
}

impl HashArgs {
    pub fn run(self) -> Result<()> {
        let mut config = self.config.resolve()?;
        if let Some(dir) = self.dir {
            config.local_dir = dir;
        }

        let local = pipeline::hash_local(&config).with_context(|| {
            format!("failed to hash '{}'", config.local_dir.display())
        })?;
        print!("{}", manifest::to_canonical_json(&local)?);
        Ok(())
    }
}
