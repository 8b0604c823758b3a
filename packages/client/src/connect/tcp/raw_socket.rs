//! TCP implementation of the raw socket contract

use std::io::{self, Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::sync::Arc;
use std::time::Duration;

use super::basic_connection::connect_to_address_list;
use super::dns::resolve_host_sync;
use super::socket_config::configure_tcp_socket;
use crate::config::SocketOptions;
use crate::connect::types::{RawControl, RawReader, RawSocket, RawSocketProvider, RawWriter};

/// TCP socket that starts unconnected, like a freshly allocated OS socket.
#[derive(Debug, Default)]
pub struct TcpRawSocket {
    stream: Option<TcpStream>,
    local: Option<SocketAddr>,
    read_timeout: Option<Duration>,
    options: SocketOptions,
}

impl TcpRawSocket {
    #[must_use]
    pub fn new(options: SocketOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    /// Wrap an already connected stream.
    #[must_use]
    pub fn from_stream(stream: TcpStream) -> Self {
        Self {
            stream: Some(stream),
            ..Self::default()
        }
    }

    fn stream_mut(&mut self) -> io::Result<&mut TcpStream> {
        self.stream
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "socket is not connected"))
    }
}

impl RawSocket for TcpRawSocket {
    fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    fn connect(&mut self, host: &str, port: u16, timeout: Option<Duration>) -> io::Result<()> {
        if self.stream.is_some() {
            return Err(io::Error::new(io::ErrorKind::AlreadyExists, "socket is already connected"));
        }

        let addrs = resolve_host_sync(host, port)?;
        let stream = connect_to_address_list(&addrs, self.local, timeout)?;
        configure_tcp_socket(&stream, &self.options)?;
        stream.set_read_timeout(self.read_timeout)?;

        tracing::debug!("Connected raw socket to {}:{} via {:?}", host, port, stream.peer_addr());
        self.stream = Some(stream);
        Ok(())
    }

    fn bind(&mut self, local: SocketAddr) -> io::Result<()> {
        if self.stream.is_some() {
            return Err(io::Error::new(io::ErrorKind::AlreadyExists, "socket is already connected"));
        }
        self.local = Some(local);
        Ok(())
    }

    fn set_read_timeout(&mut self, timeout: Option<Duration>) -> io::Result<()> {
        self.read_timeout = timeout;
        match &self.stream {
            Some(stream) => stream.set_read_timeout(timeout),
            None => Ok(()),
        }
    }

    fn control(&self) -> io::Result<Arc<dyn RawControl>> {
        match &self.stream {
            Some(stream) => Ok(Arc::new(stream.try_clone()?)),
            None => Err(io::Error::new(io::ErrorKind::NotConnected, "socket is not connected")),
        }
    }

    fn split(self: Box<Self>) -> io::Result<(RawReader, RawWriter)> {
        let stream = self
            .stream
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "socket is not connected"))?;
        let writer = stream.try_clone()?;
        Ok((Box::new(stream), Box::new(writer)))
    }
}

impl Read for TcpRawSocket {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.stream_mut()?.read(buf)
    }
}

impl Write for TcpRawSocket {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.stream_mut()?.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.stream_mut()?.flush()
    }
}

/// Provider of unconnected [`TcpRawSocket`]s.
#[derive(Debug, Clone, Default)]
pub struct TcpSocketProvider {
    options: SocketOptions,
}

impl TcpSocketProvider {
    #[must_use]
    pub fn new(options: SocketOptions) -> Self {
        Self { options }
    }
}

impl RawSocketProvider for TcpSocketProvider {
    fn create(&self) -> io::Result<Box<dyn RawSocket>> {
        Ok(Box::new(TcpRawSocket::new(self.options.clone())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;

    #[test]
    fn unconnected_socket_rejects_io_and_control() {
        let mut socket = TcpRawSocket::default();
        assert!(!socket.is_connected());
        assert_eq!(socket.read(&mut [0u8; 4]).unwrap_err().kind(), io::ErrorKind::NotConnected);
        assert_eq!(socket.control().unwrap_err().kind(), io::ErrorKind::NotConnected);
    }

    #[test]
    fn timeout_set_before_connect_is_applied() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();

        let mut socket = TcpRawSocket::new(SocketOptions::default());
        socket.set_read_timeout(Some(Duration::from_millis(250))).unwrap();
        socket.connect("127.0.0.1", port, None).unwrap();

        let control = socket.control().unwrap();
        assert_eq!(control.read_timeout().unwrap(), Some(Duration::from_millis(250)));
        assert_eq!(control.peer_addr().unwrap().port(), port);
    }

    #[test]
    fn split_halves_share_one_connection() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();

        let mut socket = TcpRawSocket::default();
        socket.connect("127.0.0.1", port, None).unwrap();
        let (mut peer, _) = listener.accept().unwrap();

        let (mut reader, mut writer) = Box::new(socket).split().unwrap();
        writer.write_all(b"up").unwrap();
        let mut buf = [0u8; 2];
        peer.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"up");

        peer.write_all(b"dn").unwrap();
        reader.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"dn");
    }

    #[test]
    fn unconnected_socket_cannot_split() {
        let err = Box::new(TcpRawSocket::default()).split().err().unwrap();
        assert_eq!(err.kind(), io::ErrorKind::NotConnected);
    }

    #[test]
    fn refused_connect_surfaces_transport_error() {
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };

        let mut socket = TcpRawSocket::default();
        let err = socket.connect("127.0.0.1", port, Some(Duration::from_secs(2))).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::ConnectionRefused);
        assert!(!socket.is_connected());
    }
}
