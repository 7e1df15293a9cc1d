//! Local hash builder — scans a local root into a [`Manifest`].
//!
//! Every regular file beneath the root is streamed through SHA-256 in
//! fixed-size chunks and keyed by its forward-slash relative path. Files are
//! hashed in parallel; the manifest itself is a sorted map, so the result does
//! not depend on scheduling.

use std::fs::File;
use std::io::Read;
use std::path::{Component, Path, PathBuf};

use rayon::prelude::*;
use sha2::{Digest, Sha256};
use walkdir::WalkDir;

use hashsync_core::{validate_rel_path, DeployConfig, Fingerprint, Manifest};

use crate::error::{io_err, SyncError};

/// Read size for streaming file content through the hasher.
pub const CHUNK_SIZE: usize = 128 * 1024;

/// What to skip and how long fingerprints are.
#[derive(Debug, Clone)]
pub struct HashOptions {
    /// File or directory names skipped anywhere in the tree.
    pub exclude: Vec<String>,
    /// Hex characters kept from each digest.
    pub fingerprint_len: usize,
    /// Relative path of a bookkeeping file at the root that is never hashed.
    pub bookkeeping: Option<String>,
}

impl HashOptions {
    pub fn from_config(config: &DeployConfig) -> Self {
        Self {
            exclude: config.exclude.clone(),
            fingerprint_len: config.fingerprint_len,
            bookkeeping: Some(config.manifest_name.clone()),
        }
    }
}

/// Build the manifest for every regular file under `root`.
///
/// Any unreadable file or directory fails the whole build: a partial manifest
/// would turn missing entries into remote deletions.
pub fn build_manifest(root: &Path, options: &HashOptions) -> Result<Manifest, SyncError> {
    let files = collect_files(root, options)?;
    tracing::debug!("hashing {} file(s) under {}", files.len(), root.display());

    let entries = files
        .par_iter()
        .map(|(rel, abs)| hash_file(abs, options.fingerprint_len).map(|fp| (rel.clone(), fp)))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(entries.into_iter().collect())
}

/// Fingerprint a single file's byte content.
pub fn hash_file(path: &Path, fingerprint_len: usize) -> Result<Fingerprint, SyncError> {
    let mut file = File::open(path).map_err(|e| io_err(path, e))?;
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; CHUNK_SIZE];

    loop {
        let read = file.read(&mut buffer).map_err(|e| io_err(path, e))?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }

    Ok(Fingerprint::truncated(
        hex::encode(hasher.finalize()),
        fingerprint_len,
    ))
}

/// Fingerprint an in-memory buffer the same way [`hash_file`] does.
pub fn hash_bytes(data: &[u8], fingerprint_len: usize) -> Fingerprint {
    Fingerprint::truncated(hex::encode(Sha256::digest(data)), fingerprint_len)
}

fn collect_files(root: &Path, options: &HashOptions) -> Result<Vec<(String, PathBuf)>, SyncError> {
    let walker = WalkDir::new(root)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| {
            e.depth() == 0
                || e.file_name()
                    .to_str()
                    .map(|name| !options.exclude.iter().any(|x| x == name))
                    .unwrap_or(true)
        });

    let mut files = Vec::new();
    for entry in walker {
        let entry = entry.map_err(|source| SyncError::Walk {
            path: root.to_path_buf(),
            source,
        })?;
        if !entry.file_type().is_file() {
            continue;
        }

        let rel = relative_key(root, entry.path())?;
        validate_rel_path(&rel).map_err(|reason| SyncError::UnsupportedPath {
            path: rel.clone(),
            reason,
        })?;
        if options.bookkeeping.as_deref() == Some(rel.as_str()) {
            tracing::debug!("skipping bookkeeping file {rel}");
            continue;
        }
        files.push((rel, entry.into_path()));
    }
    Ok(files)
}

/// `root/a/b.txt` → `"a/b.txt"`, regardless of the platform separator.
fn relative_key(root: &Path, path: &Path) -> Result<String, SyncError> {
    let rel = path.strip_prefix(root).unwrap_or(path);
    let mut parts = Vec::new();
    for component in rel.components() {
        if let Component::Normal(part) = component {
            let part = part.to_str().ok_or_else(|| SyncError::NonUtf8Path {
                path: path.to_path_buf(),
            })?;
            parts.push(part);
        }
    }
    Ok(parts.join("/"))
}
