//! Negotiated session details

use std::fmt;

use serde::Serialize;

/// Peer host, protocol version and cipher suite of a completed handshake.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionMetadata {
    pub peer_host: String,
    pub protocol: String,
    pub cipher_suite: String,
}

impl SessionMetadata {
    pub fn new(
        peer_host: impl Into<String>,
        protocol: impl Into<String>,
        cipher_suite: impl Into<String>,
    ) -> Self {
        Self {
            peer_host: peer_host.into(),
            protocol: protocol.into(),
            cipher_suite: cipher_suite.into(),
        }
    }
}

impl fmt::Display for SessionMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} using {} ({})", self.peer_host, self.protocol, self.cipher_suite)
    }
}
