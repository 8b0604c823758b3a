//! Route configuration loaded from JSON or the environment
//!
//! ```json
//! {
//!   "upgrade_hosts": ["amazing.today", "vtov.studio"],
//!   "match_strategy": "suffix",
//!   "protocol": "tls12",
//!   "read_timeout_ms": 30000,
//!   "trust_self_signed": false
//! }
//! ```
//!
//! Missing fields keep their defaults. [`RouteConfig::with_env`] replaces
//! the allow-list with the comma-separated hosts in `TLSROUTE_UPGRADE_HOSTS`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tlsroute_client::{MatchStrategy, TlsVersion};

/// Environment variable holding a comma-separated allow-list.
pub const UPGRADE_HOSTS_ENV: &str = "TLSROUTE_UPGRADE_HOSTS";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RouteConfig {
    /// Allow-list; `None` keeps the built-in hosts
    pub upgrade_hosts: Option<Vec<String>>,
    pub match_strategy: MatchStrategy,
    pub protocol: TlsVersion,
    /// 0 blocks indefinitely
    pub read_timeout_ms: u64,
    /// `None` keeps the default connect timeout
    pub connect_timeout_ms: Option<u64>,
    pub trust_self_signed: bool,
    pub extra_root_certs: Vec<PathBuf>,
}

/// Failure to load a [`RouteConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read route config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid route config: {0}")]
    Parse(#[from] serde_json::Error),
}

impl RouteConfig {
    /// # Errors
    ///
    /// Returns `ConfigError::Parse` for malformed JSON or unknown fields.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// # Errors
    ///
    /// Returns `ConfigError::Read` if the file cannot be read and
    /// `ConfigError::Parse` if its content is invalid.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// Apply `TLSROUTE_UPGRADE_HOSTS` if it is set.
    #[must_use]
    pub fn with_env(self) -> Self {
        match std::env::var(UPGRADE_HOSTS_ENV) {
            Ok(value) => self.with_hosts_list(&value),
            Err(_) => self,
        }
    }

    /// Replace the allow-list with the comma-separated entries in `value`.
    #[must_use]
    pub fn with_hosts_list(mut self, value: &str) -> Self {
        let hosts: Vec<String> = value
            .split(',')
            .map(str::trim)
            .filter(|host| !host.is_empty())
            .map(str::to_owned)
            .collect();
        tracing::debug!("Allow-list from {}: {:?}", UPGRADE_HOSTS_ENV, hosts);
        self.upgrade_hosts = Some(hosts);
        self
    }

    #[must_use]
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    #[must_use]
    pub fn connect_timeout(&self) -> Option<Duration> {
        self.connect_timeout_ms.map(Duration::from_millis)
    }
}
