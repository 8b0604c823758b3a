//! Secure stream wrapped as a socket

use std::fmt;
use std::io::{self, Read, Write};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use super::state::SocketState;
use crate::connect::types::{RawControl, RawSocket, SecureSocket, SecureStream, SessionMetadata};
use crate::error::{self, Error, Result};
use crate::tls::{HandshakeOptions, TlsEngine};

/// Settings applied while a [`TlsSocket`] is being established.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EstablishOptions {
    /// Read timeout set on the raw socket before it connects
    pub read_timeout: Option<Duration>,
    pub connect_timeout: Option<Duration>,
    pub handshake: HandshakeOptions,
}

/// One logical TLS connection to `host:port`.
///
/// Owns the raw transport and the engine's stream for its whole life. The
/// raw transport is shut down exactly once, on close or on failure.
pub struct TlsSocket {
    host: String,
    port: u16,
    state: AtomicU8,
    stream: OnceLock<Box<dyn SecureStream>>,
    control: OnceLock<Arc<dyn RawControl>>,
    session: OnceLock<SessionMetadata>,
    raw_shut_down: AtomicBool,
}

impl TlsSocket {
    #[must_use]
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            state: AtomicU8::new(SocketState::Created as u8),
            stream: OnceLock::new(),
            control: OnceLock::new(),
            session: OnceLock::new(),
            raw_shut_down: AtomicBool::new(false),
        }
    }

    /// Connect `raw` if needed, then run the client handshake through `engine`.
    ///
    /// # Errors
    ///
    /// - `Kind::Connect` if the raw socket cannot be configured or connected
    /// - `Kind::Handshake` if the engine rejects the exchange
    /// - `Kind::Closed` if the socket is not in the created state or was
    ///   closed while establishing
    ///
    /// On every error the raw socket has been shut down and the state is
    /// `Failed` (or `Closed` if a concurrent close won).
    pub fn establish(
        &self,
        mut raw: Box<dyn RawSocket>,
        engine: &dyn TlsEngine,
        options: &EstablishOptions,
    ) -> Result<()> {
        self.transition(SocketState::Created, SocketState::Connecting)?;

        if let Err(e) = raw.set_read_timeout(options.read_timeout) {
            return Err(self.fail(error::connect(e)));
        }

        if !raw.is_connected() {
            tracing::debug!("Connecting raw socket to {}:{}", self.host, self.port);
            if let Err(e) = raw.connect(&self.host, self.port, options.connect_timeout) {
                return Err(self.fail(error::connect(e)));
            }
        }

        match raw.control() {
            Ok(control) => {
                let _ = self.control.set(control);
            }
            Err(e) => return Err(self.fail(error::connect(e))),
        }

        if let Err(e) = self.transition(SocketState::Connecting, SocketState::Handshaking) {
            self.shutdown_raw();
            return Err(e);
        }

        let session = match engine.handshake(raw, &self.host, &options.handshake) {
            Ok(session) => session,
            Err(e) => return Err(self.fail(error::handshake(e))),
        };

        let _ = self.session.set(session.metadata);
        if self.stream.set(session.stream).is_err() {
            return Err(self.fail(error::handshake("secure stream installed twice")));
        }

        if let Err(e) = self.transition(SocketState::Handshaking, SocketState::Established) {
            self.shutdown_raw();
            return Err(e);
        }

        if let Some(session) = self.session.get() {
            tracing::info!("Established TLS to {}:{} - {}", self.host, self.port, session);
        }
        Ok(())
    }

    #[must_use]
    pub fn state(&self) -> SocketState {
        SocketState::from_u8(self.state.load(Ordering::Acquire))
    }

    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }

    fn transition(&self, from: SocketState, to: SocketState) -> Result<()> {
        debug_assert!(from.can_transition_to(to));
        self.state
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| ())
            .map_err(|_| error::closed().with_target(&self.host, self.port))
    }

    fn fail(&self, err: Error) -> Error {
        let mut current = self.state();
        while !current.is_terminal() {
            match self.state.compare_exchange(
                current as u8,
                SocketState::Failed as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => break,
                Err(actual) => current = SocketState::from_u8(actual),
            }
        }

        self.shutdown_raw();
        let err = err.with_target(&self.host, self.port);
        tracing::debug!("{}", err);
        err
    }

    fn shutdown_raw(&self) {
        let Some(control) = self.control.get() else {
            return;
        };
        if self.raw_shut_down.swap(true, Ordering::AcqRel) {
            return;
        }
        if let Err(e) = control.shutdown() {
            tracing::debug!("Raw shutdown of {}:{} failed: {}", self.host, self.port, e);
        }
    }

    fn with_stream<T>(
        &self,
        op: impl FnOnce(&dyn SecureStream) -> io::Result<T>,
    ) -> io::Result<T> {
        if self.state() != SocketState::Established {
            return Err(error::socket_unusable());
        }
        let stream = self.stream.get().ok_or_else(error::socket_unusable)?;

        let result = op(stream.as_ref());
        if self.state() != SocketState::Established {
            return Err(error::socket_unusable());
        }
        result
    }

    fn require_established(&self) -> io::Result<&Arc<dyn RawControl>> {
        if self.state() != SocketState::Established {
            return Err(error::socket_unusable());
        }
        self.control.get().ok_or_else(error::socket_unusable)
    }

    fn raw_control(&self) -> io::Result<&Arc<dyn RawControl>> {
        self.control
            .get()
            .ok_or_else(|| {
                io::Error::new(io::ErrorKind::NotConnected, "socket was never connected")
            })
    }
}

impl SecureSocket for TlsSocket {
    fn recv(&self, buf: &mut [u8]) -> io::Result<usize> {
        self.with_stream(|stream| stream.read(buf))
    }

    fn send(&self, buf: &[u8]) -> io::Result<usize> {
        self.with_stream(|stream| stream.write(buf))
    }

    fn flush_output(&self) -> io::Result<()> {
        self.with_stream(|stream| stream.flush())
    }

    fn is_connected(&self) -> bool {
        self.state() == SocketState::Established
    }

    fn is_closed(&self) -> bool {
        self.state() == SocketState::Closed
    }

    fn peer_addr(&self) -> io::Result<SocketAddr> {
        self.raw_control()?.peer_addr()
    }

    fn local_addr(&self) -> io::Result<SocketAddr> {
        self.raw_control()?.local_addr()
    }

    fn read_timeout(&self) -> io::Result<Option<Duration>> {
        self.require_established()?.read_timeout()
    }

    fn set_read_timeout(&self, timeout: Option<Duration>) -> io::Result<()> {
        self.require_established()?.set_read_timeout(timeout)
    }

    fn session(&self) -> Option<&SessionMetadata> {
        self.session.get()
    }

    fn close(&self) -> io::Result<()> {
        let mut previous = self.state();
        loop {
            if previous.is_terminal() {
                return Ok(());
            }
            match self.state.compare_exchange(
                previous as u8,
                SocketState::Closed as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => break,
                Err(actual) => previous = SocketState::from_u8(actual),
            }
        }

        // Blocked readers and writers are woken by the raw shutdown below.
        if previous == SocketState::Established
            && let Some(stream) = self.stream.get()
            && let Err(e) = stream.close_notify()
        {
            tracing::debug!("close_notify to {}:{} failed: {}", self.host, self.port, e);
        }

        self.shutdown_raw();
        tracing::debug!("Closed {}:{}", self.host, self.port);
        Ok(())
    }
}

impl Drop for TlsSocket {
    fn drop(&mut self) {
        let _ = SecureSocket::close(self);
    }
}

impl fmt::Debug for TlsSocket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TlsSocket")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("state", &self.state())
            .field("session", &self.session.get())
            .finish_non_exhaustive()
    }
}

impl Read for &TlsSocket {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.recv(buf)
    }
}

impl Write for &TlsSocket {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.send(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.flush_output()
    }
}
