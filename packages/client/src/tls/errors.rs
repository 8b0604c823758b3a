//! TLS-specific error types for detailed error handling

/// Failures raised while driving a client handshake
#[derive(Debug, thiserror::Error)]
pub enum TlsError {
    #[error("Invalid server name {0:?}")]
    InvalidServerName(String),
    #[error("TLS engine rejected the exchange: {0}")]
    Protocol(#[from] rustls::Error),
    #[error("I/O error during handshake: {0}")]
    Io(#[from] std::io::Error),
    #[error("Certificate verifier could not be built: {0}")]
    Verifier(#[from] rustls::client::VerifierBuilderError),
    #[error("Peer closed the connection before the handshake completed")]
    Eof,
}

impl TlsError {
    /// Sort a transport error raised by rustls into protocol or plain I/O.
    pub(crate) fn from_handshake_io(err: std::io::Error) -> Self {
        match err
            .get_ref()
            .and_then(|inner| inner.downcast_ref::<rustls::Error>())
        {
            Some(tls) => TlsError::Protocol(tls.clone()),
            None if err.kind() == std::io::ErrorKind::UnexpectedEof => TlsError::Eof,
            None => TlsError::Io(err),
        }
    }
}
