//! DNS resolution utilities for TCP connections
//!
//! Numeric addresses skip the resolver entirely.

use std::io;
use std::net::{IpAddr, SocketAddr, ToSocketAddrs};
use std::str::FromStr;

/// Resolve hostname to socket addresses synchronously.
///
/// # Errors
///
/// Returns the resolver error, or `NotFound` if the name resolved to nothing.
pub fn resolve_host_sync(host: &str, port: u16) -> io::Result<Vec<SocketAddr>> {
    // Fast path for IP addresses - avoid DNS lookup
    let bare = host.trim_start_matches('[').trim_end_matches(']');
    if let Ok(ip) = IpAddr::from_str(bare) {
        return Ok(vec![SocketAddr::new(ip, port)]);
    }

    let addrs: Vec<SocketAddr> = (host, port).to_socket_addrs()?.collect();
    if addrs.is_empty() {
        Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("No addresses resolved for {host}"),
        ))
    } else {
        Ok(addrs)
    }
}
