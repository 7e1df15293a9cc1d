//! `hashsync deploy` — upload changed files, delete removed ones, publish.

use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use hashsync_ftp::FtpsConnector;
use hashsync_sync::pipeline::{self, DeployOutcome, RunOptions};
use hashsync_sync::ChangeSet;

use super::commit::maybe_commit;
use super::config::ConfigArgs;
use super::report::{print_changes, print_report};

/// Arguments for `hashsync deploy`.
#[derive(Args, Debug)]
pub struct DeployArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Skip the confirmation prompt.
    #[arg(long, short = 'y')]
    pub yes: bool,

    /// Show what would change without uploading or deleting anything.
    #[arg(long)]
    pub dry_run: bool,

    /// Commit the working tree with this message after a successful deploy.
    #[arg(long, short = 'm', value_name = "MSG")]
    pub commit_message: Option<String>,
}

impl DeployArgs {
    pub fn run(self) -> Result<()> {
        let config = self.config.resolve()?;
        let yes = self.yes;

        let outcome = pipeline::run(
            &config,
            &FtpsConnector,
            RunOptions {
                dry_run: self.dry_run,
            },
            |changes| {
                print_changes(changes);
                yes || confirm()
            },
        )
        .context("deploy failed")?;

        match outcome {
            DeployOutcome::UpToDate(changes) => {
                println!(
                    "No changes detected ({} files). Nothing to deploy.",
                    changes.unchanged
                );
            }
            DeployOutcome::Planned(changes) => {
                print_changes(&changes);
                println!("[dry-run] nothing uploaded or deleted");
            }
            DeployOutcome::Aborted(_) => println!("Aborted by user."),
            DeployOutcome::Deployed(report) => {
                print_report(&report);
                if let Some(message) = self.commit_message.as_deref() {
                    commit(message, &report.changes)?;
                }
            }
        }
        Ok(())
    }
}

/// Ask on stdin; anything but `esc` proceeds. EOF or a read error aborts.
fn confirm() -> bool {
    print!(
        "{} ",
        "Press ENTER to continue, or type 'esc' to abort:".bold()
    );
    let _ = io::stdout().flush();

    let mut line = String::new();
    match io::stdin().lock().read_line(&mut line) {
        Ok(0) | Err(_) => false,
        Ok(_) => !line.trim().eq_ignore_ascii_case("esc"),
    }
}

fn commit(message: &str, changes: &ChangeSet) -> Result<()> {
    let repo_root = std::env::current_dir().context("could not determine working directory")?;
    maybe_commit(message, &changes.touched_paths(), &repo_root);
    Ok(())
}
