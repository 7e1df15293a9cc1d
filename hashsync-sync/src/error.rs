//! Error types for hashsync-sync.

use std::path::PathBuf;

use thiserror::Error;

use hashsync_core::ConfigError;

use crate::remote::RemoteError;

/// Fatal errors that abort a deploy run before the manifest is published.
///
/// Routine remote conditions (missing manifest, already-existing directory,
/// non-empty directory during pruning) never surface here, and delete-side
/// failures are collected on the report instead.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Required settings missing or invalid.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Directory traversal of the local root failed.
    #[error("failed to walk {path}: {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    /// A local I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A local file name cannot be expressed as a manifest key.
    #[error("path is not valid UTF-8: {path}")]
    NonUtf8Path { path: PathBuf },

    /// A local file name would not survive as a manifest key on the next run.
    #[error("cannot deploy local file '{path}': {reason}")]
    UnsupportedPath { path: String, reason: String },

    /// Connection, authentication or secure-channel negotiation failed.
    #[error("failed to open remote session: {0}")]
    Connect(#[source] RemoteError),

    /// The remote manifest exists but could not be retrieved.
    #[error("failed to load remote manifest '{name}': {source}")]
    LoadManifest {
        name: String,
        #[source]
        source: RemoteError,
    },

    /// The remote manifest was retrieved but its content is unusable.
    #[error("remote manifest '{name}' is malformed: {reason}")]
    MalformedManifest { name: String, reason: String },

    /// Creating ancestor directories or transferring file content failed.
    #[error("upload of {path} failed: {source}")]
    Upload {
        path: String,
        #[source]
        source: RemoteError,
    },

    /// Writing the new manifest failed; the previous manifest stays authoritative.
    #[error("failed to publish manifest '{name}': {source}")]
    Publish {
        name: String,
        #[source]
        source: RemoteError,
    },

    /// JSON serialization error (manifest).
    #[error("manifest JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience constructor for [`SyncError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SyncError {
    SyncError::Io {
        path: path.into(),
        source,
    }
}
