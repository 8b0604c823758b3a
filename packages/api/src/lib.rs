//! tlsroute public API
//!
//! Force a TLS protocol version for an allow-list of hosts while every other
//! host keeps the platform TLS pipeline. Build a factory with [`TlsRoute`]
//! (or from a [`RouteConfig`]) and create sockets through [`SocketFactory`].

#![deny(unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]

pub mod builder;
pub mod config;

pub use builder::*;
pub use config::{ConfigError, RouteConfig, UPGRADE_HOSTS_ENV};

// Re-export important types from client package
pub use tlsroute_client::{
    CIPHER_SUITES, DEFAULT_UPGRADE_HOSTS, DispatchingFactory, Error, FactoryConfig,
    HandshakeObserver, HostPolicy, Kind, MatchStrategy, PlatformFactory, RawSocket, Result,
    SecureSocket, SessionMetadata, SocketFactory, SocketState, TlsVersion,
};

/// Factory with the built-in allow-list and default configuration.
///
/// # Errors
///
/// Returns a configuration error if the trust roots cannot be loaded.
pub fn factory() -> Result<DispatchingFactory> {
    TlsRoute::new().build()
}

/// Factory configured from `config`, with `TLSROUTE_UPGRADE_HOSTS` applied.
///
/// # Errors
///
/// Returns a configuration error for invalid hosts or settings.
pub fn from_config(config: RouteConfig) -> Result<DispatchingFactory> {
    TlsRoute::from_config(&config.with_env()).build()
}
