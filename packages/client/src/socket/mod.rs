//! Socket adapter
//!
//! [`TlsSocket`] presents the TLS engine's secure stream as a socket:
//! connect-state queries, addresses, read timeout on the raw transport,
//! session introspection and idempotent close.

pub mod adapter;
pub mod state;

pub use adapter::{EstablishOptions, TlsSocket};
pub use state::SocketState;

/// Cipher suites the upgrade path may negotiate, by IANA name.
pub const CIPHER_SUITES: &[&str] = &[
    "TLS13_AES_256_GCM_SHA384",
    "TLS13_AES_128_GCM_SHA256",
    "TLS13_CHACHA20_POLY1305_SHA256",
    "TLS_ECDHE_ECDSA_WITH_AES_256_GCM_SHA384",
    "TLS_ECDHE_ECDSA_WITH_AES_128_GCM_SHA256",
    "TLS_ECDHE_ECDSA_WITH_CHACHA20_POLY1305_SHA256",
    "TLS_ECDHE_RSA_WITH_AES_256_GCM_SHA384",
    "TLS_ECDHE_RSA_WITH_AES_128_GCM_SHA256",
    "TLS_ECDHE_RSA_WITH_CHACHA20_POLY1305_SHA256",
];
