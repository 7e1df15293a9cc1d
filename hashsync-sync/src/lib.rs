//! # hashsync-sync
//!
//! Incremental deploy engine: content-hash change detection, manifest diff,
//! and remote-tree reconciliation over a single sequential session.
//!
//! Call [`pipeline::run`] with a [`DeployConfig`](hashsync_core::DeployConfig)
//! and a [`Connector`] to perform a deploy. [`memory::MemoryStore`] stands in
//! for a real remote store in tests.

pub mod diff;
pub mod error;
pub mod hasher;
pub mod manifest;
pub mod memory;
pub mod mutator;
pub mod pipeline;
pub mod remote;

pub use diff::{diff, ChangeKind, ChangeSet, Upload};
pub use error::SyncError;
pub use mutator::{DeleteIssue, DeleteReport, DeleteStep, RemoteMutator};
pub use pipeline::{DeployOutcome, DeployReport, RunOptions};
pub use remote::{Connector, EntryKind, RemoteError, RemoteStore};
