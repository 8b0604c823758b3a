//! Protocol version selection for the upgrade path.

use serde::{Deserialize, Serialize};

/// TLS version enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TlsVersion {
    #[default]
    #[serde(alias = "TLSv1.2")]
    Tls12,
    #[serde(alias = "TLSv1.3")]
    Tls13,
}

impl TlsVersion {
    /// The single rustls protocol version this selection forces.
    #[must_use]
    pub fn rustls_version(self) -> &'static rustls::SupportedProtocolVersion {
        match self {
            TlsVersion::Tls12 => &rustls::version::TLS12,
            TlsVersion::Tls13 => &rustls::version::TLS13,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            TlsVersion::Tls12 => "TLSv1.2",
            TlsVersion::Tls13 => "TLSv1.3",
        }
    }
}

impl std::fmt::Display for TlsVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
