//! Layered deploy configuration: YAML file < environment < flags.
//!
//! clap resolves the environment/flag layers (`env = ...`); this module lays
//! them over the optional YAML file.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use hashsync_core::DeployConfig;

/// Settings shared by every subcommand.
#[derive(Args, Debug, Default)]
pub struct ConfigArgs {
    /// YAML config file; environment variables and flags override its values.
    #[arg(long, env = "HASHSYNC_CONFIG", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Local directory to deploy from.
    #[arg(long, env = "DEPLOY_LOCAL_DIR", value_name = "DIR")]
    pub local_dir: Option<PathBuf>,

    /// Remote directory to deploy to.
    #[arg(long, env = "DEPLOY_REMOTE_DIR", value_name = "DIR")]
    pub remote_dir: Option<String>,

    /// Manifest file name under the remote directory [default: _hashes.json].
    #[arg(long, env = "DEPLOY_HASH_FILE", value_name = "NAME")]
    pub manifest_name: Option<String>,

    /// Hex characters kept from each SHA-256 digest (1-64) [default: 8].
    #[arg(long, env = "DEPLOY_FINGERPRINT_LEN", value_name = "N")]
    pub fingerprint_len: Option<usize>,

    /// File or directory name to skip while hashing; repeatable. Replaces the default list.
    #[arg(long = "exclude", value_name = "NAME")]
    pub exclude: Vec<String>,

    /// FTP server hostname.
    #[arg(long, env = "FTP_SERVER")]
    pub host: Option<String>,

    /// FTP server port [default: 21].
    #[arg(long, env = "FTP_PORT")]
    pub port: Option<u16>,

    /// FTP user name.
    #[arg(long = "user", env = "FTP_NAME")]
    pub username: Option<String>,

    /// FTP password.
    #[arg(long, env = "FTP_PW", hide_env_values = true)]
    pub password: Option<String>,
}

impl ConfigArgs {
    /// Build the [`DeployConfig`] for this invocation. Validation is left to the engine.
    pub fn resolve(&self) -> Result<DeployConfig> {
        let mut config = match &self.config {
            Some(path) => DeployConfig::load_yaml(path)
                .with_context(|| format!("failed to load config '{}'", path.display()))?,
            None => DeployConfig::default(),
        };

        if let Some(dir) = &self.local_dir {
            config.local_dir = dir.clone();
        }
        if let Some(dir) = &self.remote_dir {
            config.remote_dir = dir.clone();
        }
        if let Some(name) = &self.manifest_name {
            config.manifest_name = name.clone();
        }
        if let Some(len) = self.fingerprint_len {
            config.fingerprint_len = len;
        }
        if !self.exclude.is_empty() {
            config.exclude = self.exclude.clone();
        }
        if let Some(host) = &self.host {
            config.remote.host = host.clone();
        }
        if let Some(port) = self.port {
            config.remote.port = port;
        }
        if let Some(user) = &self.username {
            config.remote.username = user.clone();
        }
        if let Some(password) = &self.password {
            config.remote.password = password.clone();
        }

        tracing::debug!(?config, "resolved deploy configuration");
        Ok(config)
    }
}
