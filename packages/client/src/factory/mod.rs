//! Socket factories
//!
//! [`SocketFactory`] is the creation contract shared by the
//! [`DispatchingFactory`], which upgrades allow-listed hosts, and the
//! [`PlatformFactory`] it delegates everything else to.

use std::net::IpAddr;

use crate::connect::types::{RawSocket, SecureSocket};
use crate::error::Result;

pub mod dispatch;
pub mod observer;
pub mod platform;

pub use dispatch::{DispatchingFactory, DispatchingFactoryBuilder};
pub use observer::HandshakeObserver;
pub use platform::PlatformFactory;

/// Creates connected, handshaken secure sockets.
///
/// Every entry point blocks until the connection is established or has
/// failed. Implementations must be shareable across threads.
pub trait SocketFactory: Send + Sync + std::fmt::Debug {
    /// Layer TLS over `existing` aimed at `host:port`, or over a fresh raw
    /// socket when `existing` is `None`.
    ///
    /// # Errors
    ///
    /// Connect, handshake or configuration errors tagged with the target.
    fn create_layered(
        &self,
        existing: Option<Box<dyn RawSocket>>,
        host: &str,
        port: u16,
        auto_close: bool,
    ) -> Result<Box<dyn SecureSocket>>;

    /// # Errors
    ///
    /// Connect or handshake errors tagged with the target.
    fn create(&self, host: &str, port: u16) -> Result<Box<dyn SecureSocket>>;

    /// # Errors
    ///
    /// Connect or handshake errors tagged with the target.
    fn create_with_addr(&self, addr: IpAddr, port: u16) -> Result<Box<dyn SecureSocket>>;

    /// # Errors
    ///
    /// Connect or handshake errors tagged with the target, or an
    /// unsupported error where local binding is not implemented.
    fn create_bound(
        &self,
        host: &str,
        port: u16,
        local_addr: IpAddr,
        local_port: u16,
    ) -> Result<Box<dyn SecureSocket>>;

    /// # Errors
    ///
    /// Connect or handshake errors tagged with the target.
    fn create_with_addr_bound(
        &self,
        addr: IpAddr,
        port: u16,
        local_addr: IpAddr,
        local_port: u16,
    ) -> Result<Box<dyn SecureSocket>>;

    fn default_cipher_suites(&self) -> Vec<String>;

    fn supported_cipher_suites(&self) -> Vec<String>;
}
