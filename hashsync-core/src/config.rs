//! Deploy configuration.
//!
//! A [`DeployConfig`] is built once (YAML file, environment, flags — see the
//! CLI) and handed to the engine's entry point. Nothing downstream reads the
//! environment.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::types::MAX_FINGERPRINT_LEN;

pub const DEFAULT_MANIFEST_NAME: &str = "_hashes.json";
pub const DEFAULT_PORT: u16 = 21;
pub const DEFAULT_FINGERPRINT_LEN: usize = 8;

fn default_manifest_name() -> String {
    DEFAULT_MANIFEST_NAME.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_fingerprint_len() -> usize {
    DEFAULT_FINGERPRINT_LEN
}

fn default_exclude() -> Vec<String> {
    vec![".DS_Store".to_string()]
}

/// Connection settings for the remote store.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteConfig {
    #[serde(default)]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: default_port(),
            username: String::new(),
            password: String::new(),
        }
    }
}

impl fmt::Debug for RemoteConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Everything one deploy run needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployConfig {
    /// Local tree to publish.
    #[serde(default)]
    pub local_dir: PathBuf,
    /// Deploy root on the remote store.
    #[serde(default)]
    pub remote_dir: String,
    /// Manifest object name, directly under `remote_dir`.
    #[serde(default = "default_manifest_name")]
    pub manifest_name: String,
    /// Number of hex characters kept from each SHA-256 digest.
    #[serde(default = "default_fingerprint_len")]
    pub fingerprint_len: usize,
    /// File or directory names skipped while hashing.
    #[serde(default = "default_exclude")]
    pub exclude: Vec<String>,
    #[serde(default)]
    pub remote: RemoteConfig,
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            local_dir: PathBuf::new(),
            remote_dir: String::new(),
            manifest_name: default_manifest_name(),
            fingerprint_len: default_fingerprint_len(),
            exclude: default_exclude(),
            remote: RemoteConfig::default(),
        }
    }
}

impl DeployConfig {
    /// Load a config from a YAML file. Unset keys take their defaults.
    pub fn load_yaml(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_yaml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Validate everything required for a deploy run.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_local()?;
        if self.remote.host.trim().is_empty() {
            return Err(ConfigError::Missing("remote host"));
        }
        if self.remote.username.is_empty() {
            return Err(ConfigError::Missing("remote username"));
        }
        if self.remote.password.is_empty() {
            return Err(ConfigError::Missing("remote password"));
        }
        if self.remote.port == 0 {
            return Err(ConfigError::Invalid {
                field: "port",
                reason: "must be non-zero".to_string(),
            });
        }
        if self.remote_dir.trim().is_empty() {
            return Err(ConfigError::Missing("remote dir"));
        }
        Ok(())
    }

    /// Validate only the settings needed to hash the local tree.
    pub fn validate_local(&self) -> Result<(), ConfigError> {
        if self.local_dir.as_os_str().is_empty() {
            return Err(ConfigError::Missing("local dir"));
        }
        if !self.local_dir.is_dir() {
            return Err(ConfigError::Invalid {
                field: "local dir",
                reason: format!("{} is not a directory", self.local_dir.display()),
            });
        }
        if self.manifest_name.is_empty() {
            return Err(ConfigError::Missing("manifest name"));
        }
        if self.manifest_name.contains('/') || self.manifest_name.contains('\\') {
            return Err(ConfigError::Invalid {
                field: "manifest name",
                reason: format!(
                    "'{}' must name an object directly under the remote dir",
                    self.manifest_name
                ),
            });
        }
        if self.fingerprint_len == 0 || self.fingerprint_len > MAX_FINGERPRINT_LEN {
            return Err(ConfigError::Invalid {
                field: "fingerprint length",
                reason: format!(
                    "{} is outside 1..={MAX_FINGERPRINT_LEN}",
                    self.fingerprint_len
                ),
            });
        }
        Ok(())
    }
}
