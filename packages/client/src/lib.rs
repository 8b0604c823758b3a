//! # tlsroute client
//!
//! Socket factory that routes TLS connections per host. Host names on an
//! allow-list are connected with a forced protocol version, a restricted
//! cipher-suite list and optional self-signed trust; every other request is
//! handed unchanged to a default factory using the platform trust store.
//!
//! ## Features
//!
//! - **Host policy** with substring, suffix or exact matching
//! - **Rustls TLS** with the ring provider and native root certificates
//! - **Socket adapter** with idempotent close that interrupts blocked reads
//! - **Handshake observer** for connection diagnostics
//! - **In-memory transport** for loopback use without a network
//!
//! ## Usage
//!
//! ```no_run
//! use std::io::{Read, Write};
//! use tlsroute_client::{DispatchingFactory, FactoryConfig, HostPolicy, SocketFactory};
//!
//! let factory = DispatchingFactory::new(HostPolicy::default(), FactoryConfig::default())?;
//! let socket = factory.create("amazing.today", 443)?;
//!
//! let mut stream = socket.as_ref();
//! stream.write_all(b"GET / HTTP/1.1\r\nHost: amazing.today\r\nConnection: close\r\n\r\n")?;
//! let mut response = String::new();
//! stream.read_to_string(&mut response)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod config;
pub mod connect;
pub mod error;
pub mod factory;
pub mod policy;
pub mod socket;
pub mod tls;

pub use crate::config::{ConfigurationError, FactoryConfig, SocketOptions, TlsVersion};
pub use crate::connect::{
    MemoryProbe, MemorySocket, RawControl, RawReader, RawSocket, RawSocketProvider, RawWriter,
    SecureSocket, SecureStream, SessionMetadata, TcpRawSocket, TcpSocketProvider,
};
pub use crate::error::{Error, Kind, Result};
pub use crate::factory::{
    DispatchingFactory, DispatchingFactoryBuilder, HandshakeObserver, PlatformFactory,
    SocketFactory,
};
pub use crate::policy::{DEFAULT_UPGRADE_HOSTS, HostPolicy, MatchStrategy};
pub use crate::socket::{CIPHER_SUITES, SocketState, TlsSocket};
pub use crate::tls::{RustlsEngine, TlsEngine, TlsError};
