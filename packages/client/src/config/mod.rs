//! Factory configuration
//!
//! A [`FactoryConfig`] is captured by value when a dispatching factory is
//! built and never changes afterwards. Use the factory's `with_*` methods to
//! derive an instance with different settings.

use std::path::PathBuf;
use std::time::Duration;

pub mod network;
pub mod security;

pub use network::SocketOptions;
pub use security::TlsVersion;

/// Read timeout applied to raw sockets when none is configured (0 = block indefinitely).
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::ZERO;

/// Connect timeout used for raw sockets opened by this crate.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Configuration of one dispatching factory instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FactoryConfig {
    /// Accept certificate chains that fail validation on the upgrade path
    pub trust_self_signed: bool,
    /// Read timeout set on the raw socket; `Duration::ZERO` disables it
    pub read_timeout: Duration,
    /// Bound on the raw connect; `None` uses the platform default
    pub connect_timeout: Option<Duration>,
    /// Protocol version forced for upgraded hosts
    pub protocol: TlsVersion,
    pub socket: SocketOptions,
    /// PEM files whose certificates are added to the trust roots
    pub extra_root_certs: Vec<PathBuf>,
}

impl Default for FactoryConfig {
    fn default() -> Self {
        Self {
            trust_self_signed: false,
            read_timeout: DEFAULT_READ_TIMEOUT,
            connect_timeout: Some(DEFAULT_CONNECT_TIMEOUT),
            protocol: TlsVersion::default(),
            socket: SocketOptions::default(),
            extra_root_certs: Vec::new(),
        }
    }
}

impl FactoryConfig {
    /// The read timeout in the form `set_read_timeout` expects.
    #[must_use]
    pub fn read_timeout_option(&self) -> Option<Duration> {
        if self.read_timeout.is_zero() {
            None
        } else {
            Some(self.read_timeout)
        }
    }

    /// Validates the configuration for correctness and consistency
    ///
    /// # Errors
    ///
    /// Returns a `ConfigurationError` if the connect timeout is zero or an
    /// extra root certificate path does not exist.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.connect_timeout.is_some_and(|t| t.is_zero()) {
            return Err(ConfigurationError::Timeout(
                "connect timeout must be non-zero when set".to_string(),
            ));
        }

        if let Some(missing) = self.extra_root_certs.iter().find(|p| !p.exists()) {
            return Err(ConfigurationError::RootCertificates(format!(
                "{} does not exist",
                missing.display()
            )));
        }

        Ok(())
    }
}

/// Configuration validation and error handling
#[derive(Debug, thiserror::Error)]
pub enum ConfigurationError {
    #[error("Invalid allow-list entry {0:?}: {1}")]
    HostEntry(String, &'static str),
    #[error("Invalid timeout configuration: {0}")]
    Timeout(String),
    #[error("Invalid root certificates: {0}")]
    RootCertificates(String),
    #[error("No cipher suites available for {0}")]
    NoCipherSuites(TlsVersion),
}
