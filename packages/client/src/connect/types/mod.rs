//! Connection types and trait definitions
//!
//! - `raw`: unencrypted transports and their control handles
//! - `secure`: the encrypted stream and the socket contract built on it
//! - `session`: negotiated session metadata

pub mod raw;
pub mod secure;
pub mod session;

pub use raw::{RawControl, RawReader, RawSocket, RawSocketProvider, RawWriter};
pub use secure::{SecureSocket, SecureStream};
pub use session::SessionMetadata;
