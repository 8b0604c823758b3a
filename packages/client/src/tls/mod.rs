//! TLS engine adapter
//!
//! The engine performs the protocol work; this module only converts raw
//! transports into the shape rustls expects and converts its stream back
//! into a [`SecureStream`](crate::connect::SecureStream).

pub mod engine;
pub mod errors;
pub mod roots;
pub mod verifier;

pub use engine::{EngineSession, HandshakeOptions, RustlsEngine, TlsEngine};
pub use errors::TlsError;
pub use roots::{add_pem_roots, bundled_roots, platform_roots};
pub use verifier::SelfSignedTrust;
