//! Raw connection management
//!
//! Transport abstractions the TLS engine runs over, with a TCP
//! implementation for real hosts and an in-memory one for loopback use.

pub mod memory;
pub mod tcp;
pub mod types;

pub use memory::{MemoryProbe, MemorySocket};
pub use tcp::{TcpRawSocket, TcpSocketProvider, connect_to_address_list, resolve_host_sync};
pub use types::{
    RawControl, RawReader, RawSocket, RawSocketProvider, RawWriter, SecureSocket, SecureStream,
    SessionMetadata,
};
