//! Remote mutator — directory creation, upload, recursive deletion and
//! empty-directory pruning against an open [`RemoteStore`] session.
//!
//! Uploads are all-or-nothing for the run: the first failure is returned and
//! the caller must not publish. Deletes are best-effort: anything other than
//! "already gone" or "not empty" is recorded as a [`DeleteIssue`] and the run
//! moves on.

use std::fmt;
use std::fs::File;
use std::path::Path;

use serde::Serialize;

use hashsync_core::types::{ancestors, parent, validate_rel_path};

use crate::error::SyncError;
use crate::remote::{EntryKind, RemoteError, RemoteStore};

/// Step of a delete during which a non-fatal failure occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeleteStep {
    Refuse,
    Stat,
    RemoveFile,
    List,
    RemoveDir,
    Prune,
}

impl fmt::Display for DeleteStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Refuse => "refuse",
            Self::Stat => "stat",
            Self::RemoveFile => "delete file",
            Self::List => "list",
            Self::RemoveDir => "remove dir",
            Self::Prune => "prune",
        };
        f.write_str(s)
    }
}

/// A delete-side failure that was logged and skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeleteIssue {
    pub path: String,
    pub step: DeleteStep,
    pub message: String,
}

impl fmt::Display for DeleteIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}: {}", self.step, self.path, self.message)
    }
}

/// Everything the delete phase did, accumulated across targets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeleteReport {
    /// Files removed, including those inside removed directories.
    pub files: Vec<String>,
    /// Directories removed as delete targets or inside one.
    pub dirs: Vec<String>,
    /// Ancestor directories removed because they became empty.
    pub pruned: Vec<String>,
    /// Targets that no longer existed.
    pub already_gone: Vec<String>,
    pub issues: Vec<DeleteIssue>,
}

impl DeleteReport {
    fn issue(&mut self, path: &str, step: DeleteStep, message: impl fmt::Display) {
        tracing::warn!("could not {step} {path}: {message}");
        self.issues.push(DeleteIssue {
            path: path.to_string(),
            step,
            message: message.to_string(),
        });
    }
}

/// Applies remote mutations over a borrowed session.
pub struct RemoteMutator<'s, S: RemoteStore + ?Sized> {
    store: &'s mut S,
}

impl<'s, S: RemoteStore + ?Sized> RemoteMutator<'s, S> {
    pub fn new(store: &'s mut S) -> Self {
        Self { store }
    }

    /// Create every ancestor directory of `path`, outermost first.
    ///
    /// No listing is assumed beforehand; "already exists" counts as success.
    pub fn ensure_ancestors(&mut self, path: &str) -> Result<(), RemoteError> {
        for dir in ancestors(path) {
            match self.store.make_dir(dir) {
                Ok(()) => tracing::debug!("MKD {dir}"),
                Err(RemoteError::AlreadyExists { .. }) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    /// Upload `local` to `remote`, creating ancestors first.
    ///
    /// Returns the number of bytes transferred. Every failure, local or
    /// remote, is a [`SyncError::Upload`].
    pub fn upload_file(&mut self, local: &Path, remote: &str) -> Result<u64, SyncError> {
        let upload_err = |source| SyncError::Upload {
            path: remote.to_string(),
            source,
        };

        self.ensure_ancestors(remote).map_err(upload_err)?;
        let mut file = File::open(local).map_err(|e| upload_err(RemoteError::Io(e)))?;
        let bytes = self.store.put(remote, &mut file).map_err(upload_err)?;
        tracing::info!("PUT      {remote}");
        Ok(bytes)
    }

    /// Delete `path`, whatever it currently is, recording the outcome in `report`.
    ///
    /// A file is removed and its emptied ancestors pruned. A directory is
    /// removed with all its descendants. A missing target is a no-op.
    /// Never touches the deploy root.
    pub fn delete_path(&mut self, path: &str, report: &mut DeleteReport) {
        if let Err(reason) = validate_rel_path(path) {
            report.issue(path, DeleteStep::Refuse, reason);
            return;
        }

        match self.store.kind_of(path) {
            Ok(EntryKind::Missing) => {
                tracing::debug!("already gone: {path}");
                report.already_gone.push(path.to_string());
            }
            Ok(EntryKind::File) => match self.store.remove_file(path) {
                Ok(()) => {
                    tracing::info!("DEL file {path}");
                    report.files.push(path.to_string());
                    self.prune_ancestors(path, report);
                }
                Err(e @ RemoteError::NotFound { .. }) => self.confirm_gone(path, e, report),
                Err(e) => report.issue(path, DeleteStep::RemoveFile, e),
            },
            Ok(EntryKind::Directory) => self.remove_tree(path, report),
            Err(e) => report.issue(path, DeleteStep::Stat, e),
        }
    }

    /// Remove now-empty ancestors of a deleted file, innermost first.
    ///
    /// Stops at the first directory that is not empty, on any other failure,
    /// or below the deploy root, whichever comes first.
    pub fn prune_ancestors(&mut self, path: &str, report: &mut DeleteReport) {
        let mut current = parent(path);
        while let Some(dir) = current {
            match self.store.remove_dir(dir) {
                Ok(()) => {
                    tracing::info!("RMD empty dir {dir}");
                    report.pruned.push(dir.to_string());
                }
                Err(RemoteError::NotEmpty { .. }) => {
                    tracing::debug!("stop pruning at non-empty {dir}");
                    break;
                }
                Err(e) => {
                    report.issue(dir, DeleteStep::Prune, e);
                    break;
                }
            }
            current = parent(dir);
        }
    }

    /// A file seen a moment ago was reported "not found" on delete. Servers
    /// answer refusals with the same reply, so only a fresh type query decides.
    fn confirm_gone(&mut self, path: &str, err: RemoteError, report: &mut DeleteReport) {
        match self.store.kind_of(path) {
            Ok(EntryKind::Missing) => {
                tracing::debug!("already gone: {path}");
                report.already_gone.push(path.to_string());
            }
            Ok(_) => report.issue(path, DeleteStep::RemoveFile, err),
            Err(e) => report.issue(path, DeleteStep::Stat, e),
        }
    }

    fn remove_tree(&mut self, dir: &str, report: &mut DeleteReport) {
        let entries = match self.store.list_dir(dir) {
            Ok(entries) => entries,
            Err(RemoteError::NotFound { .. }) => {
                report.already_gone.push(dir.to_string());
                return;
            }
            Err(e) => {
                report.issue(dir, DeleteStep::List, e);
                return;
            }
        };

        for name in entries {
            if name == "." || name == ".." {
                continue;
            }
            let child = format!("{dir}/{name}");
            if let Err(reason) = validate_rel_path(&child) {
                report.issue(&child, DeleteStep::Refuse, reason);
                continue;
            }
            match self.store.kind_of(&child) {
                Ok(EntryKind::File) => match self.store.remove_file(&child) {
                    Ok(()) => {
                        tracing::info!("DEL file {child}");
                        report.files.push(child);
                    }
                    Err(e @ RemoteError::NotFound { .. }) => {
                        self.confirm_gone(&child, e, report)
                    }
                    Err(e) => report.issue(&child, DeleteStep::RemoveFile, e),
                },
                Ok(EntryKind::Directory) => self.remove_tree(&child, report),
                Ok(EntryKind::Missing) => {}
                Err(e) => report.issue(&child, DeleteStep::Stat, e),
            }
        }

        match self.store.remove_dir(dir) {
            Ok(()) => {
                tracing::info!("DEL dir  {dir}");
                report.dirs.push(dir.to_string());
            }
            Err(e) => report.issue(dir, DeleteStep::RemoveDir, e),
        }
    }
}
