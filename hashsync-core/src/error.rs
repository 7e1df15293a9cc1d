//! Error types for hashsync-core.

use std::path::PathBuf;

use thiserror::Error;

/// Configuration is missing or invalid. Always raised before any connection attempt.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Underlying I/O failure reading a config file.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML parse error on load — includes file path and line context from serde_yaml.
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// A required setting was not provided.
    #[error("missing required setting: {0}")]
    Missing(&'static str),

    /// A setting was provided but cannot be used.
    #[error("invalid setting {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}
