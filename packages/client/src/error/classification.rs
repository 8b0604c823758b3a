use std::error::Error as StdError;
use std::io;

use super::types::{Error, Kind};

impl Error {
    /// Returns true if the error came from validating configuration.
    #[must_use]
    pub fn is_config(&self) -> bool {
        matches!(self.inner.kind, Kind::Config)
    }

    /// Returns true if the host could not be reached.
    #[must_use]
    pub fn is_connect(&self) -> bool {
        matches!(self.inner.kind, Kind::Connect)
    }

    /// Returns true if the host was reached but TLS failed.
    #[must_use]
    pub fn is_handshake(&self) -> bool {
        matches!(self.inner.kind, Kind::Handshake)
    }

    #[must_use]
    pub fn is_unsupported(&self) -> bool {
        matches!(self.inner.kind, Kind::Unsupported)
    }

    /// Returns true if the socket was closed or had already failed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        matches!(self.inner.kind, Kind::Closed)
    }

    /// Returns true if the error is related to a timeout.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        let mut source = self.source();

        while let Some(err) = source {
            if let Some(io) = err.downcast_ref::<io::Error>()
                && matches!(io.kind(), io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock)
            {
                return true;
            }
            source = err.source();
        }

        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error;

    #[test]
    fn timeout_is_found_through_the_source_chain() {
        let engine = crate::tls::TlsError::Io(io::Error::new(io::ErrorKind::WouldBlock, "read"));
        let err = error::handshake(engine).with_target("amazing.today", 443);

        assert!(err.is_handshake());
        assert!(err.is_timeout());
        assert!(!err.is_connect());
    }

    #[test]
    fn display_carries_target() {
        let err = error::connect(io::Error::from(io::ErrorKind::ConnectionRefused))
            .with_target("amazing.today", 443);
        let text = err.to_string();

        assert!(text.starts_with("connection error (amazing.today:443)"));
        assert_eq!(err.target().map(|t| t.port), Some(443));
    }

    #[test]
    fn socket_unusable_is_detectable() {
        let io_err = error::socket_unusable();
        assert_eq!(io_err.kind(), io::ErrorKind::NotConnected);
        assert!(error::is_socket_unusable(&io_err));
        assert!(!error::is_socket_unusable(&io::Error::other("other")));
    }
}
