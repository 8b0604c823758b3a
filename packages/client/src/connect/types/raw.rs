//! Raw byte-stream transport abstractions
//!
//! A raw socket is the unencrypted duplex stream a TLS engine runs over.
//! [`RawControl`] is a second handle onto the same transport that can be used
//! while another thread is blocked inside a read, so timeouts can be changed
//! and the transport shut down without taking the reader's lock.

use std::io::{self, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream};
use std::sync::Arc;
use std::time::Duration;

/// Read half of a split raw transport.
pub type RawReader = Box<dyn Read + Send>;

/// Write half of a split raw transport.
pub type RawWriter = Box<dyn Write + Send>;

/// Unencrypted duplex transport, connected or not yet connected.
pub trait RawSocket: Read + Write + Send + std::fmt::Debug {
    fn is_connected(&self) -> bool;

    /// Connect to `host:port`, bounded by `timeout` when given.
    ///
    /// # Errors
    ///
    /// Returns the transport error if resolution or every connect attempt fails.
    fn connect(&mut self, host: &str, port: u16, timeout: Option<Duration>) -> io::Result<()>;

    /// Bind the local end before connecting.
    ///
    /// # Errors
    ///
    /// Returns an error if the transport is already connected or has no
    /// notion of a local address.
    fn bind(&mut self, local: SocketAddr) -> io::Result<()>;

    /// Set the read timeout; applied on connect if the socket is not connected yet.
    ///
    /// # Errors
    ///
    /// Returns the error reported by the underlying transport.
    fn set_read_timeout(&mut self, timeout: Option<Duration>) -> io::Result<()>;

    /// A control handle onto this connected transport.
    ///
    /// # Errors
    ///
    /// Returns `NotConnected` before a successful [`RawSocket::connect`].
    fn control(&self) -> io::Result<Arc<dyn RawControl>>;

    /// Split a connected transport into halves usable from separate threads.
    ///
    /// # Errors
    ///
    /// Returns `NotConnected` before a successful [`RawSocket::connect`], or
    /// the error raised while duplicating the underlying handle.
    fn split(self: Box<Self>) -> io::Result<(RawReader, RawWriter)>;
}

/// Out-of-band handle onto a connected raw transport.
pub trait RawControl: Send + Sync + std::fmt::Debug {
    /// # Errors
    ///
    /// Returns the error reported by the underlying transport.
    fn set_read_timeout(&self, timeout: Option<Duration>) -> io::Result<()>;

    /// # Errors
    ///
    /// Returns the error reported by the underlying transport.
    fn read_timeout(&self) -> io::Result<Option<Duration>>;

    /// # Errors
    ///
    /// Returns `NotConnected` if the peer address cannot be determined.
    fn peer_addr(&self) -> io::Result<SocketAddr>;

    /// # Errors
    ///
    /// Returns `NotConnected` if the local address cannot be determined.
    fn local_addr(&self) -> io::Result<SocketAddr>;

    /// Shut both directions down, waking any thread blocked on the transport.
    ///
    /// # Errors
    ///
    /// Returns the error reported by the underlying transport.
    fn shutdown(&self) -> io::Result<()>;
}

/// Creates unconnected raw sockets for the upgrade path.
pub trait RawSocketProvider: Send + Sync + std::fmt::Debug {
    /// # Errors
    ///
    /// Returns an error if no socket can be allocated.
    fn create(&self) -> io::Result<Box<dyn RawSocket>>;
}

impl RawControl for TcpStream {
    fn set_read_timeout(&self, timeout: Option<Duration>) -> io::Result<()> {
        TcpStream::set_read_timeout(self, timeout)
    }

    fn read_timeout(&self) -> io::Result<Option<Duration>> {
        TcpStream::read_timeout(self)
    }

    fn peer_addr(&self) -> io::Result<SocketAddr> {
        TcpStream::peer_addr(self)
    }

    fn local_addr(&self) -> io::Result<SocketAddr> {
        TcpStream::local_addr(self)
    }

    fn shutdown(&self) -> io::Result<()> {
        match TcpStream::shutdown(self, Shutdown::Both) {
            // The peer may already have torn the connection down.
            Err(e) if e.kind() == io::ErrorKind::NotConnected => Ok(()),
            other => other,
        }
    }
}
