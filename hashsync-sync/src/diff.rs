//! Diff engine — compares the local and remote manifests.
//!
//! Pure and deterministic: no I/O, output sorted by path.

use serde::Serialize;

use hashsync_core::Manifest;

/// Why a path needs uploading. Reporting only; both upload the same way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    /// Absent from the remote manifest.
    New,
    /// Present remotely with a different fingerprint.
    Modified,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Upload {
    pub path: String,
    pub kind: ChangeKind,
}

/// Classification of every path in `local ∪ remote`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChangeSet {
    /// Paths to upload, sorted.
    pub uploads: Vec<Upload>,
    /// Paths to delete remotely, sorted.
    pub deletes: Vec<String>,
    /// Number of paths identical on both sides.
    pub unchanged: usize,
}

impl ChangeSet {
    /// `true` when there is nothing to upload and nothing to delete.
    pub fn is_empty(&self) -> bool {
        self.uploads.is_empty() && self.deletes.is_empty()
    }

    pub fn upload_paths(&self) -> impl Iterator<Item = &str> {
        self.uploads.iter().map(|u| u.path.as_str())
    }

    pub fn new_files(&self) -> impl Iterator<Item = &str> {
        self.of_kind(ChangeKind::New)
    }

    pub fn modified_files(&self) -> impl Iterator<Item = &str> {
        self.of_kind(ChangeKind::Modified)
    }

    /// New, then modified, then deleted paths.
    pub fn touched_paths(&self) -> Vec<&str> {
        self.new_files()
            .chain(self.modified_files())
            .chain(self.deletes.iter().map(String::as_str))
            .collect()
    }

    fn of_kind(&self, kind: ChangeKind) -> impl Iterator<Item = &str> {
        self.uploads
            .iter()
            .filter(move |u| u.kind == kind)
            .map(|u| u.path.as_str())
    }
}

/// Compute what must change remotely to make it match `local`.
pub fn diff(local: &Manifest, remote: &Manifest) -> ChangeSet {
    let mut changes = ChangeSet::default();

    for (path, fingerprint) in local.iter() {
        match remote.get(path) {
            None => changes.uploads.push(Upload {
                path: path.clone(),
                kind: ChangeKind::New,
            }),
            Some(existing) if existing != fingerprint => changes.uploads.push(Upload {
                path: path.clone(),
                kind: ChangeKind::Modified,
            }),
            Some(_) => changes.unchanged += 1,
        }
    }

    changes.deletes = remote
        .paths()
        .filter(|path| !local.contains(path))
        .cloned()
        .collect();

    changes
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;

    fn manifest(entries: &[(&str, &str)]) -> Manifest {
        entries.iter().copied().collect()
    }

    #[test]
    fn first_deploy_uploads_everything() {
        let changes = diff(&manifest(&[("a.txt", "h1")]), &Manifest::new());
        assert_eq!(changes.upload_paths().collect::<Vec<_>>(), vec!["a.txt"]);
        assert_eq!(changes.new_files().count(), 1);
        assert!(changes.deletes.is_empty());
    }

    #[test]
    fn removed_local_file_is_deleted() {
        let changes = diff(
            &manifest(&[("a.txt", "h1")]),
            &manifest(&[("a.txt", "h1"), ("b.txt", "h2")]),
        );
        assert_eq!(changes.upload_paths().count(), 0);
        assert_eq!(changes.deletes, vec!["b.txt"]);
        assert_eq!(changes.unchanged, 1);
    }

    #[test]
    fn changed_fingerprint_is_modified() {
        let changes = diff(&manifest(&[("a.txt", "h2")]), &manifest(&[("a.txt", "h1")]));
        assert_eq!(changes.modified_files().collect::<Vec<_>>(), vec!["a.txt"]);
        assert_eq!(changes.new_files().count(), 0);
    }

    #[test]
    fn identical_manifests_yield_no_changes() {
        let m = manifest(&[("a.txt", "h1"), ("dir/b.txt", "h2")]);
        let changes = diff(&m, &m.clone());
        assert!(changes.is_empty());
        assert_eq!(changes.unchanged, 2);
    }

    #[test]
    fn paths_are_case_sensitive() {
        let changes = diff(&manifest(&[("A.txt", "h1")]), &manifest(&[("a.txt", "h1")]));
        assert_eq!(changes.upload_paths().collect::<Vec<_>>(), vec!["A.txt"]);
        assert_eq!(changes.deletes, vec!["a.txt"]);
    }

    #[test]
    fn every_path_lands_in_exactly_one_class() {
        let local = manifest(&[
            ("keep.txt", "01"),
            ("changed.txt", "02"),
            ("added.txt", "03"),
            ("dir/nested.txt", "04"),
        ]);
        let remote = manifest(&[
            ("keep.txt", "01"),
            ("changed.txt", "ff"),
            ("gone.txt", "05"),
            ("dir/old.txt", "06"),
        ]);

        let changes = diff(&local, &remote);
        let uploads: BTreeSet<_> = changes.upload_paths().collect();
        let deletes: BTreeSet<_> = changes.deletes.iter().map(String::as_str).collect();

        assert!(uploads.is_disjoint(&deletes));

        let all: BTreeSet<&str> = local
            .paths()
            .chain(remote.paths())
            .map(String::as_str)
            .collect();
        assert_eq!(uploads.len() + deletes.len() + changes.unchanged, all.len());
        assert_eq!(
            changes.touched_paths(),
            vec!["added.txt", "dir/nested.txt", "changed.txt", "dir/old.txt", "gone.txt"]
        );
    }
}
