//! Platform default factory
//!
//! Full-chain validation with the platform roots and every protocol version
//! rustls supports. This is what non-upgraded hosts receive.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use super::SocketFactory;
use crate::config::{DEFAULT_CONNECT_TIMEOUT, SocketOptions};
use crate::connect::tcp::TcpSocketProvider;
use crate::connect::types::{RawSocket, RawSocketProvider, SecureSocket};
use crate::error::{self, Result};
use crate::socket::{EstablishOptions, TlsSocket};
use crate::tls::{HandshakeOptions, RustlsEngine, TlsEngine, platform_roots};

#[derive(Debug, Clone)]
pub struct PlatformFactory {
    engine: Arc<dyn TlsEngine>,
    sockets: Arc<dyn RawSocketProvider>,
    options: EstablishOptions,
}

impl PlatformFactory {
    /// Factory over TCP using the platform trust store.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if no usable root certificates were found.
    pub fn new() -> Result<Self> {
        let engine = RustlsEngine::platform(platform_roots()).map_err(error::config)?;
        Ok(Self::with_parts(
            Arc::new(engine),
            Arc::new(TcpSocketProvider::new(SocketOptions::default())),
        ))
    }

    /// Factory over the given engine and raw socket source.
    #[must_use]
    pub fn with_parts(engine: Arc<dyn TlsEngine>, sockets: Arc<dyn RawSocketProvider>) -> Self {
        Self {
            engine,
            sockets,
            options: EstablishOptions {
                read_timeout: None,
                connect_timeout: Some(DEFAULT_CONNECT_TIMEOUT),
                handshake: HandshakeOptions::default(),
            },
        }
    }

    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.options.connect_timeout = timeout;
        self
    }

    fn raw_socket(&self, host: &str, port: u16) -> Result<Box<dyn RawSocket>> {
        self.sockets
            .create()
            .map_err(|e| error::connect(e).with_target(host, port))
    }

    fn establish(
        &self,
        raw: Box<dyn RawSocket>,
        host: &str,
        port: u16,
    ) -> Result<Box<dyn SecureSocket>> {
        let socket = TlsSocket::new(host, port);
        socket.establish(raw, self.engine.as_ref(), &self.options)?;
        Ok(Box::new(socket))
    }

    fn establish_bound(
        &self,
        host: &str,
        port: u16,
        local_addr: IpAddr,
        local_port: u16,
    ) -> Result<Box<dyn SecureSocket>> {
        let mut raw = self.raw_socket(host, port)?;
        raw.bind(SocketAddr::new(local_addr, local_port))
            .map_err(|e| error::connect(e).with_target(host, port))?;
        self.establish(raw, host, port)
    }
}

impl SocketFactory for PlatformFactory {
    fn create_layered(
        &self,
        existing: Option<Box<dyn RawSocket>>,
        host: &str,
        port: u16,
        _auto_close: bool,
    ) -> Result<Box<dyn SecureSocket>> {
        // The adapter owns the raw socket from here on and closes it with itself.
        let raw = match existing {
            Some(raw) => raw,
            None => self.raw_socket(host, port)?,
        };
        self.establish(raw, host, port)
    }

    fn create(&self, host: &str, port: u16) -> Result<Box<dyn SecureSocket>> {
        let raw = self.raw_socket(host, port)?;
        self.establish(raw, host, port)
    }

    fn create_with_addr(&self, addr: IpAddr, port: u16) -> Result<Box<dyn SecureSocket>> {
        let host = addr.to_string();
        let raw = self.raw_socket(&host, port)?;
        self.establish(raw, &host, port)
    }

    fn create_bound(
        &self,
        host: &str,
        port: u16,
        local_addr: IpAddr,
        local_port: u16,
    ) -> Result<Box<dyn SecureSocket>> {
        self.establish_bound(host, port, local_addr, local_port)
    }

    fn create_with_addr_bound(
        &self,
        addr: IpAddr,
        port: u16,
        local_addr: IpAddr,
        local_port: u16,
    ) -> Result<Box<dyn SecureSocket>> {
        self.establish_bound(&addr.to_string(), port, local_addr, local_port)
    }

    fn default_cipher_suites(&self) -> Vec<String> {
        self.engine.cipher_suites()
    }

    fn supported_cipher_suites(&self) -> Vec<String> {
        self.engine.cipher_suites()
    }
}
