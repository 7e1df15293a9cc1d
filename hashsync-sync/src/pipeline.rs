//! Deploy pipeline entrypoint used by the CLI.
//!
//! ## Sequence
//!
//! 1. Validate configuration (before any connection attempt).
//! 2. Hash the local tree.
//! 3. Open the remote session.
//! 4. Load the remote manifest and diff.
//! 5. Report / ask for approval.
//! 6. Upload, then delete.
//! 7. Publish the local manifest — the commit point.
//! 8. Release the session, on every exit path.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;

use hashsync_core::{DeployConfig, Manifest};

use crate::diff::{diff, ChangeSet};
use crate::error::SyncError;
use crate::hasher::{build_manifest, HashOptions};
use crate::manifest;
use crate::mutator::{DeleteReport, RemoteMutator};
use crate::remote::{Connector, RemoteStore};

/// Options for a pipeline run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Connect, load and diff, but mutate nothing.
    pub dry_run: bool,
}

/// What a completed deploy did.
#[derive(Debug, Clone, Serialize)]
pub struct DeployReport {
    pub changes: ChangeSet,
    pub uploaded: Vec<String>,
    pub bytes_uploaded: u64,
    pub deletes: DeleteReport,
    pub manifest_entries: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// How a pipeline run ended.
#[derive(Debug, Clone)]
pub enum DeployOutcome {
    /// Remote manifest already matches; nothing published.
    UpToDate(ChangeSet),
    /// `dry_run`: the changes that would be applied.
    Planned(ChangeSet),
    /// Approval was refused; nothing mutated.
    Aborted(ChangeSet),
    Deployed(DeployReport),
}

impl DeployOutcome {
    /// The change set the run computed, whatever it then did with it.
    pub fn into_changes(self) -> ChangeSet {
        match self {
            Self::UpToDate(changes) | Self::Planned(changes) | Self::Aborted(changes) => changes,
            Self::Deployed(report) => report.changes,
        }
    }
}

/// Hash the configured local tree without touching the network.
pub fn hash_local(config: &DeployConfig) -> Result<Manifest, SyncError> {
    config.validate_local()?;
    build_manifest(&config.local_dir, &HashOptions::from_config(config))
}

/// Run one deploy.
///
/// `approve` is called with the change set once it is known and non-empty
/// (never in dry-run mode); returning `false` ends the run without mutation.
pub fn run<C, A>(
    config: &DeployConfig,
    connector: &C,
    options: RunOptions,
    approve: A,
) -> Result<DeployOutcome, SyncError>
where
    C: Connector,
    A: FnOnce(&ChangeSet) -> bool,
{
    config.validate()?;
    let started_at = Utc::now();

    let local = build_manifest(&config.local_dir, &HashOptions::from_config(config))?;
    tracing::info!("local files: {} hashed", local.len());

    let mut store = connector.connect(config).map_err(SyncError::Connect)?;
    let result = run_session(&mut store, config, &local, options, approve, started_at);

    if let Err(e) = store.close() {
        tracing::warn!("failed to close remote session cleanly: {e}");
    }
    result
}

fn run_session<S, A>(
    store: &mut S,
    config: &DeployConfig,
    local: &Manifest,
    options: RunOptions,
    approve: A,
    started_at: DateTime<Utc>,
) -> Result<DeployOutcome, SyncError>
where
    S: RemoteStore + ?Sized,
    A: FnOnce(&ChangeSet) -> bool,
{
    let remote = manifest::load_remote(store, &config.manifest_name)?;
    tracing::info!("remote baseline: {} entries", remote.len());

    let changes = diff(local, &remote);
    if changes.is_empty() {
        tracing::info!("no changes detected");
        return Ok(DeployOutcome::UpToDate(changes));
    }
    if options.dry_run {
        return Ok(DeployOutcome::Planned(changes));
    }
    if !approve(&changes) {
        tracing::info!("deploy aborted before any mutation");
        return Ok(DeployOutcome::Aborted(changes));
    }

    let mut mutator = RemoteMutator::new(store);

    let mut uploaded = Vec::with_capacity(changes.uploads.len());
    let mut bytes_uploaded = 0;
    for path in changes.upload_paths() {
        bytes_uploaded += mutator.upload_file(&local_path(&config.local_dir, path), path)?;
        uploaded.push(path.to_string());
    }

    let mut deletes = DeleteReport::default();
    for path in &changes.deletes {
        mutator.delete_path(path, &mut deletes);
    }
    if !deletes.issues.is_empty() {
        tracing::warn!("{} delete step(s) skipped", deletes.issues.len());
    }

    manifest::publish(store, &config.manifest_name, local)?;

    Ok(DeployOutcome::Deployed(DeployReport {
        changes,
        uploaded,
        bytes_uploaded,
        deletes,
        manifest_entries: local.len(),
        started_at,
        finished_at: Utc::now(),
    }))
}

/// Map a manifest key back onto the local filesystem.
fn local_path(root: &Path, rel: &str) -> PathBuf {
    rel.split('/').fold(root.to_path_buf(), |acc, part| acc.join(part))
}
