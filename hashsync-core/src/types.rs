//! Domain types for deploy manifests.
//!
//! Manifest keys are POSIX-style relative paths (forward slashes, no deploy
//! root prefix). Values are truncated lowercase-hex content fingerprints.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Longest fingerprint a SHA-256 hex digest can yield.
pub const MAX_FINGERPRINT_LEN: usize = 64;

// ---------------------------------------------------------------------------
// Fingerprint
// ---------------------------------------------------------------------------

/// Truncated hex digest of a file's byte content.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(pub String);

impl Fingerprint {
    /// Keep the first `len` characters of a full lowercase hex digest.
    ///
    /// `len` is clamped to the digest length.
    pub fn truncated(mut hex_digest: String, len: usize) -> Self {
        hex_digest.truncate(len.min(hex_digest.len()));
        Self(hex_digest)
    }

    /// `true` if this is a non-empty lowercase hex string no longer than a full digest.
    pub fn is_well_formed(&self) -> bool {
        !self.0.is_empty()
            && self.0.len() <= MAX_FINGERPRINT_LEN
            && self
                .0
                .bytes()
                .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for Fingerprint {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<String> for Fingerprint {
    fn from(s: String) -> Self {
        Self(s)
    }
}

// ---------------------------------------------------------------------------
// Manifest
// ---------------------------------------------------------------------------

/// Mapping from relative path to fingerprint.
///
/// Backed by a `BTreeMap` so iteration and serialization are sorted by path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Manifest(BTreeMap<String, Fingerprint>);

impl Manifest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the fingerprint for `path`.
    pub fn insert(&mut self, path: impl Into<String>, fingerprint: impl Into<Fingerprint>) {
        self.0.insert(path.into(), fingerprint.into());
    }

    pub fn get(&self, path: &str) -> Option<&Fingerprint> {
        self.0.get(path)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.0.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Fingerprint)> {
        self.0.iter()
    }

    pub fn paths(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }
}

impl FromIterator<(String, Fingerprint)> for Manifest {
    fn from_iter<I: IntoIterator<Item = (String, Fingerprint)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> FromIterator<(&'a str, &'a str)> for Manifest {
    fn from_iter<I: IntoIterator<Item = (&'a str, &'a str)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(p, f)| (p.to_owned(), Fingerprint::from(f)))
                .collect(),
        )
    }
}

// ---------------------------------------------------------------------------
// Relative paths
// ---------------------------------------------------------------------------

/// Check that `path` is a normalized relative path beneath the deploy root.
///
/// Rejects the empty path (the root itself), absolute paths, backslashes and
/// empty, `.` or `..` segments.
pub fn validate_rel_path(path: &str) -> Result<(), String> {
    if path.is_empty() {
        return Err("empty path".to_string());
    }
    if path.starts_with('/') {
        return Err(format!("'{path}' is absolute"));
    }
    if path.contains('\\') {
        return Err(format!("'{path}' contains a backslash"));
    }
    for segment in path.split('/') {
        match segment {
            "" => return Err(format!("'{path}' has an empty segment")),
            "." | ".." => return Err(format!("'{path}' has a '{segment}' segment")),
            _ => {}
        }
    }
    Ok(())
}

/// Ancestor directories of `path`, outermost first.
///
/// `"a/b/c.txt"` yields `["a", "a/b"]`; a top-level file yields nothing.
pub fn ancestors(path: &str) -> Vec<&str> {
    path.match_indices('/').map(|(i, _)| &path[..i]).collect()
}

/// Parent directory of `path`, or `None` when `path` sits directly under the root.
pub fn parent(path: &str) -> Option<&str> {
    path.rfind('/').map(|i| &path[..i])
}
