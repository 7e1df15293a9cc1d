//! hashsync core library — manifest types, deploy configuration, errors.
//!
//! - [`types`] — [`Fingerprint`], [`Manifest`], relative-path helpers
//! - [`config`] — [`DeployConfig`] / [`RemoteConfig`] with YAML loading and validation
//! - [`error`] — [`ConfigError`]

pub mod config;
pub mod error;
pub mod types;

pub use config::{DeployConfig, RemoteConfig};
pub use error::ConfigError;
pub use types::{validate_rel_path, Fingerprint, Manifest};
