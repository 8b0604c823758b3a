//! Secure stream and socket contracts

use std::io::{self, Read, Write};
use std::net::SocketAddr;
use std::time::Duration;

use super::session::SessionMetadata;

/// Post-handshake encrypted duplex stream produced by a TLS engine.
///
/// A read and a write may run on different threads at once. A read blocked
/// on the transport never holds up a write.
pub trait SecureStream: Send + Sync {
    /// # Errors
    ///
    /// Returns the transport error, or `InvalidData` if the peer sent a
    /// record the engine rejects.
    fn read(&self, buf: &mut [u8]) -> io::Result<usize>;

    /// Encrypt `buf` and hand the records to the transport.
    ///
    /// # Errors
    ///
    /// Returns the transport error.
    fn write(&self, buf: &[u8]) -> io::Result<usize>;

    /// # Errors
    ///
    /// Returns the transport error.
    fn flush(&self) -> io::Result<()>;

    /// Send the TLS close_notify alert and flush it.
    ///
    /// Never waits for a write in flight; the alert is skipped in that case.
    ///
    /// # Errors
    ///
    /// Returns the transport error if the alert cannot be written.
    fn close_notify(&self) -> io::Result<()>;
}

/// Socket-shaped object returned by every factory entry point.
///
/// I/O takes `&self` so [`SecureSocket::close`] can be called from another
/// thread while a read is blocked. One thread may read while another
/// writes; concurrent readers (or writers) are serialized.
pub trait SecureSocket: Send + Sync + std::fmt::Debug {
    /// # Errors
    ///
    /// Fails with "socket not usable" outside the established state.
    fn recv(&self, buf: &mut [u8]) -> io::Result<usize>;

    /// # Errors
    ///
    /// Fails with "socket not usable" outside the established state.
    fn send(&self, buf: &[u8]) -> io::Result<usize>;

    /// # Errors
    ///
    /// Fails with "socket not usable" outside the established state.
    fn flush_output(&self) -> io::Result<()>;

    fn is_connected(&self) -> bool;
    fn is_closed(&self) -> bool;

    /// # Errors
    ///
    /// Returns `NotConnected` if the address cannot be determined.
    fn peer_addr(&self) -> io::Result<SocketAddr>;

    /// # Errors
    ///
    /// Returns `NotConnected` if the address cannot be determined.
    fn local_addr(&self) -> io::Result<SocketAddr>;

    /// # Errors
    ///
    /// Fails with "socket not usable" once closed.
    fn read_timeout(&self) -> io::Result<Option<Duration>>;

    /// # Errors
    ///
    /// Fails with "socket not usable" once closed.
    fn set_read_timeout(&self, timeout: Option<Duration>) -> io::Result<()>;

    fn session(&self) -> Option<&SessionMetadata>;

    fn negotiated_protocol(&self) -> Option<&str> {
        self.session().map(|s| s.protocol.as_str())
    }

    fn cipher_suite(&self) -> Option<&str> {
        self.session().map(|s| s.cipher_suite.as_str())
    }

    /// Close the socket. A second call is a no-op.
    ///
    /// # Errors
    ///
    /// Returns the transport error from shutting the raw socket down.
    fn close(&self) -> io::Result<()>;
}

impl Read for &(dyn SecureSocket + '_) {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.recv(buf)
    }
}

impl Write for &(dyn SecureSocket + '_) {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.send(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.flush_output()
    }
}
