//! hashsync — incremental FTPS deploy driven by content hashes.
//!
//! # Usage
//!
//! ```text
//! hashsync hash [DIR] [--local-dir <dir>]
//! hashsync diff [connection options] [--json]
//! hashsync deploy [connection options] [--yes] [--dry-run] [--commit-message <msg>]
//! ```
//!
//! Settings come from `--config <file.yaml>`, then the environment
//! (`FTP_SERVER`, `FTP_PORT`, `FTP_NAME`, `FTP_PW`, `DEPLOY_LOCAL_DIR`,
//! `DEPLOY_REMOTE_DIR`, `DEPLOY_HASH_FILE`, `DEPLOY_FINGERPRINT_LEN`), then
//! flags. A `.env` file in the working directory is read first.

mod commands;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};

use commands::{deploy::DeployArgs, diff::DiffArgs, hash::HashArgs};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "hashsync",
    version,
    about = "Incrementally deploy a local tree to an FTPS server",
    long_about = None,
)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace). `RUST_LOG` takes precedence.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the local manifest without connecting anywhere.
    Hash(HashArgs),

    /// Show what a deploy would upload and delete.
    Diff(DiffArgs),

    /// Upload changed files, delete removed ones, publish the manifest.
    Deploy(DeployArgs),
}

fn init_tracing(verbose: u8) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    // Missing .env is fine; the environment and flags may carry everything.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Hash(args) => args.run(),
        Commands::Diff(args) => args.run(),
        Commands::Deploy(args) => args.run(),
    }
}
