//! The remote-store seam.
//!
//! A [`RemoteStore`] is one open control session, already connected,
//! authenticated, secured and positioned at the deploy root. Every path it
//! receives is relative to that root. Methods take `&mut self`: a session
//! carries one command at a time.

use std::io::Read;

use thiserror::Error;

use hashsync_core::DeployConfig;

/// Result of an explicit type query against the remote store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
    Missing,
}

/// Failures reported by a remote store.
///
/// `NotFound`, `AlreadyExists` and `NotEmpty` are routine conditions the
/// engine recovers from; everything else is a `Transport` or `Io` failure.
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("not found: {path}")]
    NotFound { path: String },

    #[error("already exists: {path}")]
    AlreadyExists { path: String },

    #[error("directory not empty: {path}")]
    NotEmpty { path: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl RemoteError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Operations the sync engine needs from a remote store session.
pub trait RemoteStore {
    /// Classify `path` as a file, a directory, or absent.
    fn kind_of(&mut self, path: &str) -> Result<EntryKind, RemoteError>;

    /// Create one directory. Its parent must exist.
    ///
    /// Returns [`RemoteError::AlreadyExists`] when the directory is already there.
    fn make_dir(&mut self, path: &str) -> Result<(), RemoteError>;

    /// Remove an empty directory; [`RemoteError::NotEmpty`] otherwise.
    fn remove_dir(&mut self, path: &str) -> Result<(), RemoteError>;

    /// Delete a single plain file.
    fn remove_file(&mut self, path: &str) -> Result<(), RemoteError>;

    /// Names of the entries directly inside `path`, without `.` and `..`.
    fn list_dir(&mut self, path: &str) -> Result<Vec<String>, RemoteError>;

    /// Store `reader` at `path` in binary mode, creating or overwriting it.
    fn put(&mut self, path: &str, reader: &mut dyn Read) -> Result<u64, RemoteError>;

    /// Retrieve the full binary content at `path`.
    fn get(&mut self, path: &str) -> Result<Vec<u8>, RemoteError>;

    /// Release the session.
    fn close(&mut self) -> Result<(), RemoteError>;
}

/// Opens a [`RemoteStore`] session for a deploy run.
pub trait Connector {
    type Store: RemoteStore;

    fn connect(&self, config: &DeployConfig) -> Result<Self::Store, RemoteError>;
}

impl<F, S> Connector for F
where
    F: Fn(&DeployConfig) -> Result<S, RemoteError>,
    S: RemoteStore,
{
    type Store = S;

    fn connect(&self, config: &DeployConfig) -> Result<S, RemoteError> {
        self(config)
    }
}
