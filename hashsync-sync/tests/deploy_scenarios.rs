use std::fs;
use std::path::Path;

use hashsync_core::{DeployConfig, Manifest, RemoteConfig};
use hashsync_sync::{
    hasher::hash_bytes,
    manifest,
    memory::MemoryStore,
    pipeline::{self, DeployOutcome, RunOptions},
    RemoteError, SyncError,
};
use tempfile::TempDir;

const MANIFEST: &str = "_hashes.json";

fn config(local: &Path) -> DeployConfig {
    DeployConfig {
        local_dir: local.to_path_buf(),
        remote_dir: "/htdocs".to_string(),
        remote: RemoteConfig {
            host: "ftp.example.com".to_string(),
            port: 21,
            username: "deploy".to_string(),
            password: "secret".to_string(),
        },
        ..DeployConfig::default()
    }
}

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
    fs::write(path, content).expect("write");
}

fn fp(content: &str) -> String {
    hash_bytes(content.as_bytes(), 8).0
}

fn deploy(local: &Path, store: &MemoryStore) -> Result<DeployOutcome, SyncError> {
    let session = store.clone();
    let connect = move |_: &DeployConfig| -> Result<MemoryStore, RemoteError> { Ok(session.clone()) };
    pipeline::run(&config(local), &connect, RunOptions::default(), |_| true)
}

fn published(store: &MemoryStore) -> Manifest {
    let bytes = store.file(MANIFEST).expect("manifest published");
    manifest::parse(&bytes, MANIFEST).expect("parse manifest")
}

fn seed_manifest(store: MemoryStore, entries: &[(&str, &str)]) -> MemoryStore {
    let m: Manifest = entries.iter().copied().collect();
    let json = manifest::to_canonical_json(&m).expect("json");
    store.with_file(MANIFEST, json)
}

#[test]
fn first_deploy_uploads_and_publishes() {
    let local = TempDir::new().expect("local");
    write(local.path(), "a.txt", "alpha");
    let store = MemoryStore::new();

    let outcome = deploy(local.path(), &store).expect("deploy");
    let DeployOutcome::Deployed(report) = outcome else {
        panic!("expected a deploy");
    };

    assert_eq!(report.uploaded, vec!["a.txt"]);
    assert!(report.changes.deletes.is_empty());
    assert_eq!(store.file("a.txt").as_deref(), Some(&b"alpha"[..]));

    let expected: Manifest = [("a.txt", fp("alpha").as_str())].into_iter().collect();
    assert_eq!(published(&store), expected);
    assert_eq!(store.close_count(), 1);
}

#[test]
fn removed_local_file_is_deleted_remotely() {
    let local = TempDir::new().expect("local");
    write(local.path(), "a.txt", "alpha");
    let a = fp("alpha");
    let store = seed_manifest(
        MemoryStore::new()
            .with_file("a.txt", "alpha")
            .with_file("b.txt", "beta"),
        &[("a.txt", a.as_str()), ("b.txt", "0badf00d")],
    );

    let DeployOutcome::Deployed(report) = deploy(local.path(), &store).expect("deploy") else {
        panic!("expected a deploy");
    };

    assert!(report.uploaded.is_empty());
    assert_eq!(report.deletes.files, vec!["b.txt"]);
    assert!(!store.has_file("b.txt"));
    assert!(store.has_file("a.txt"));

    let expected: Manifest = [("a.txt", a.as_str())].into_iter().collect();
    assert_eq!(published(&store), expected);
}

#[test]
fn upload_failure_aborts_before_publish() {
    let local = TempDir::new().expect("local");
    write(local.path(), "a.txt", "one");
    write(local.path(), "b.txt", "two");
    write(local.path(), "c.txt", "three");
    let previous = [("old.txt", "11111111")];
    let store = seed_manifest(
        MemoryStore::new()
            .with_file("old.txt", "old")
            .fail_put_on("b.txt"),
        &previous,
    );
    let before = store.file(MANIFEST);

    let err = deploy(local.path(), &store).expect_err("upload must fail");

    assert!(matches!(err, SyncError::Upload { ref path, .. } if path == "b.txt"));
    assert!(store.has_file("a.txt"), "first upload went through");
    assert!(!store.has_file("c.txt"), "run stops at the failing upload");
    assert!(store.has_file("old.txt"), "no deletes after a failed upload");
    assert_eq!(store.file(MANIFEST), before, "manifest must be untouched");
    assert_eq!(store.close_count(), 1, "session released on failure");
}

#[test]
fn second_run_over_unchanged_tree_is_a_no_op() {
    let local = TempDir::new().expect("local");
    write(local.path(), "index.html", "<h1>hi</h1>");
    write(local.path(), "css/site.css", "body{}");
    let store = MemoryStore::new();

    deploy(local.path(), &store).expect("first deploy");
    let ops_after_first = store.ops().len();

    let outcome = deploy(local.path(), &store).expect("second deploy");
    let DeployOutcome::UpToDate(changes) = outcome else {
        panic!("expected up to date");
    };
    assert_eq!(changes.unchanged, 2);
    assert!(changes.is_empty());
    assert_eq!(store.ops().len(), ops_after_first, "nothing mutated or republished");
    assert_eq!(store.close_count(), 2);
}

#[test]
fn modified_file_is_reuploaded() {
    let local = TempDir::new().expect("local");
    write(local.path(), "page.html", "v1");
    let store = MemoryStore::new();
    deploy(local.path(), &store).expect("first deploy");

    write(local.path(), "page.html", "v2");
    let DeployOutcome::Deployed(report) = deploy(local.path(), &store).expect("deploy") else {
        panic!("expected a deploy");
    };

    assert_eq!(report.changes.modified_files().collect::<Vec<_>>(), vec!["page.html"]);
    assert_eq!(store.file("page.html").as_deref(), Some(&b"v2"[..]));
    assert_eq!(published(&store).get("page.html").map(|f| f.0.clone()), Some(fp("v2")));
}

#[test]
fn deleting_a_nested_tree_prunes_empty_directories() {
    let local = TempDir::new().expect("local");
    write(local.path(), "keep.txt", "k");
    write(local.path(), "blog/2023/post.html", "p");
    let store = MemoryStore::new();
    deploy(local.path(), &store).expect("first deploy");
    assert!(store.has_dir("blog/2023"));

    fs::remove_dir_all(local.path().join("blog")).expect("rm blog");
    let DeployOutcome::Deployed(report) = deploy(local.path(), &store).expect("deploy") else {
        panic!("expected a deploy");
    };

    assert_eq!(report.deletes.pruned, vec!["blog/2023", "blog"]);
    assert!(!store.has_dir("blog"));
    assert!(store.has_file("keep.txt"));
    assert!(store.has_file(MANIFEST), "manifest lives at the root, never pruned");
}

#[test]
fn interrupted_run_self_heals_on_next_deploy() {
    let local = TempDir::new().expect("local");
    write(local.path(), "a.txt", "one");
    write(local.path(), "b.txt", "two");
    let flaky = MemoryStore::new().fail_put_on("b.txt");
    deploy(local.path(), &flaky).expect_err("first run fails");
    assert!(flaky.file(MANIFEST).is_none());

    // Same remote tree, transport healthy again.
    let healed = MemoryStore::new().with_file("a.txt", "one");
    let DeployOutcome::Deployed(report) = deploy(local.path(), &healed).expect("deploy") else {
        panic!("expected a deploy");
    };

    assert_eq!(report.uploaded, vec!["a.txt", "b.txt"], "redundant re-upload is fine");
    assert_eq!(published(&healed).len(), 2);
}

#[test]
fn delete_issues_do_not_fail_the_run() {
    let local = TempDir::new().expect("local");
    write(local.path(), "a.txt", "alpha");
    let a = fp("alpha");
    let store = seed_manifest(
        MemoryStore::new()
            .with_file("a.txt", "alpha")
            .with_file("locked.txt", "x")
            .fail_remove_on("locked.txt"),
        &[("a.txt", a.as_str()), ("locked.txt", "22222222"), ("ghost.txt", "33333333")],
    );

    let DeployOutcome::Deployed(report) = deploy(local.path(), &store).expect("deploy") else {
        panic!("expected a deploy");
    };

    assert_eq!(report.deletes.issues.len(), 1);
    assert_eq!(report.deletes.already_gone, vec!["ghost.txt"]);
    assert_eq!(published(&store).len(), 1);
}

#[test]
fn publish_failure_keeps_previous_manifest() {
    let local = TempDir::new().expect("local");
    write(local.path(), "a.txt", "alpha");
    write(local.path(), "b.txt", "beta");
    let store = seed_manifest(MemoryStore::new(), &[("a.txt", fp("alpha").as_str())])
        .with_file("a.txt", "alpha");
    let before = store.file(MANIFEST).expect("seeded manifest");
    let store = store.fail_put_on(MANIFEST);

    let err = deploy(local.path(), &store).expect_err("publish must fail");

    assert!(matches!(err, SyncError::Publish { .. }), "{err}");
    assert_eq!(store.file(MANIFEST), Some(before));
    assert_eq!(store.close_count(), 1);
}

#[test]
#[cfg(unix)]
fn unsupported_local_name_fails_before_connecting() {
    let local = TempDir::new().expect("local");
    write(local.path(), "a.txt", "alpha");
    write(local.path(), "a\\b.txt", "slash");
    let store = MemoryStore::new();

    let err = deploy(local.path(), &store).expect_err("name must be rejected");
    assert!(matches!(err, SyncError::UnsupportedPath { .. }), "{err}");
    assert!(store.ops().is_empty());
    assert_eq!(store.close_count(), 0);

    // Once renamed, two consecutive deploys succeed and the second is a no-op.
    fs::rename(local.path().join("a\\b.txt"), local.path().join("a-b.txt")).expect("rename");
    assert!(matches!(
        deploy(local.path(), &store).expect("first deploy"),
        DeployOutcome::Deployed(_)
    ));
    assert!(matches!(
        deploy(local.path(), &store).expect("second deploy"),
        DeployOutcome::UpToDate(_)
    ));
}
