//! TCP socket configuration utilities

use std::io;
use std::net::TcpStream;

use socket2::{SockRef, TcpKeepalive};

use crate::config::SocketOptions;

/// Apply nodelay and keepalive settings to a connected stream.
///
/// # Errors
///
/// Returns the error reported by the operating system.
pub fn configure_tcp_socket(stream: &TcpStream, options: &SocketOptions) -> io::Result<()> {
    if options.nodelay {
        stream.set_nodelay(true)?;
    }

    if let Some(idle) = options.keepalive {
        SockRef::from(stream).set_tcp_keepalive(&TcpKeepalive::new().with_time(idle))?;
    }

    Ok(())
}
