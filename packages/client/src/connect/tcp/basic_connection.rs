//! Basic TCP connection establishment
//!
//! Address lists are tried in order; the last error is returned if none connects.

use std::io;
use std::net::{SocketAddr, TcpStream};
use std::time::Duration;

use socket2::{Domain, Protocol, Socket, Type};

/// Connect to first available address with timeout support.
///
/// When `local` is given the socket is bound to it first, and remote
/// addresses of the other IP family are skipped.
///
/// # Errors
///
/// Returns the last connect error, or `AddrNotAvailable` if no address could
/// be attempted.
pub fn connect_to_address_list(
    addrs: &[SocketAddr],
    local: Option<SocketAddr>,
    timeout: Option<Duration>,
) -> io::Result<TcpStream> {
    let mut last_error = None;

    for addr in addrs {
        if local.is_some_and(|l| l.is_ipv4() != addr.is_ipv4()) {
            continue;
        }

        match connect_one(*addr, local, timeout) {
            Ok(stream) => return Ok(stream),
            Err(e) => {
                tracing::debug!("Failed to connect to {}: {}", addr, e);
                last_error = Some(e);
            }
        }
    }

    Err(last_error.unwrap_or_else(|| {
        io::Error::new(io::ErrorKind::AddrNotAvailable, "No addresses to connect to")
    }))
}

fn connect_one(
    addr: SocketAddr,
    local: Option<SocketAddr>,
    timeout: Option<Duration>,
) -> io::Result<TcpStream> {
    let socket = Socket::new(Domain::for_address(addr), Type::STREAM, Some(Protocol::TCP))?;

    if let Some(local) = local {
        socket.bind(&local.into())?;
    }

    match timeout {
        Some(t) => socket.connect_timeout(&addr.into(), t)?,
        None => socket.connect(&addr.into())?,
    }

    Ok(socket.into())
}
