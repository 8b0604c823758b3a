//! TCP connection utilities
//!
//! DNS resolution, address-list connect with optional local bind, socket
//! tuning and the TCP raw socket used by default on the upgrade path.

pub mod basic_connection;
pub mod dns;
pub mod raw_socket;
pub mod socket_config;

pub use basic_connection::connect_to_address_list;
pub use dns::resolve_host_sync;
pub use raw_socket::{TcpRawSocket, TcpSocketProvider};
pub use socket_config::configure_tcp_socket;
