use std::io;

use super::types::{Error, Kind};

pub(crate) type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Creates an `Error` for a configuration error.
pub fn config<E: Into<BoxError>>(e: E) -> Error {
    Error::new(Kind::Config).with(e.into())
}

/// Creates an `Error` for a raw connect failure.
pub fn connect<E: Into<BoxError>>(e: E) -> Error {
    Error::new(Kind::Connect).with(e.into())
}

/// Creates an `Error` for a failed TLS exchange.
pub fn handshake<E: Into<BoxError>>(e: E) -> Error {
    Error::new(Kind::Handshake).with(e.into())
}

/// Creates an `Error` for an unsupported argument combination.
pub fn unsupported(what: &'static str) -> Error {
    Error::new(Kind::Unsupported).with(what)
}

/// Creates an `Error` for an operation on a closed or failed socket.
pub fn closed() -> Error {
    Error::new(Kind::Closed)
}

/// The `io::Error` returned by socket I/O once the socket is no longer usable.
pub fn socket_unusable() -> io::Error {
    io::Error::new(io::ErrorKind::NotConnected, closed())
}

/// Returns true if `err` was produced by [`socket_unusable`].
pub fn is_socket_unusable(err: &io::Error) -> bool {
    err.get_ref()
        .and_then(|inner| inner.downcast_ref::<Error>())
        .is_some_and(Error::is_closed)
}
