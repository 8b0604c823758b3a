//! In-process duplex transport
//!
//! [`MemorySocket::pair`] returns two connected ends; bytes written to one
//! are read from the other in order. Read timeouts, shutdown from another
//! thread and a [`MemoryProbe`] counting shutdown calls make it usable as a
//! loopback raw transport wherever a network is unwanted.

use std::io::{self, Read, Write};
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::{Buf, Bytes};
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, unbounded};

use crate::connect::types::{RawControl, RawReader, RawSocket, RawWriter};

#[derive(Debug)]
enum Frame {
    Data(Bytes),
    Eof,
    Wake,
}

#[derive(Debug)]
struct Shared {
    read_timeout: Mutex<Option<Duration>>,
    shut_down: AtomicBool,
    shutdown_calls: AtomicUsize,
    local: SocketAddr,
    peer: SocketAddr,
}

/// One end of an in-memory duplex connection.
#[derive(Debug)]
pub struct MemorySocket {
    reader: MemoryReader,
    writer: MemoryWriter,
    wake: Sender<Frame>,
    connected: bool,
    refuse_connect: bool,
    shared: Arc<Shared>,
}

#[derive(Debug)]
struct MemoryReader {
    inbound: Receiver<Frame>,
    pending: Bytes,
    eof: bool,
    shared: Arc<Shared>,
}

#[derive(Debug)]
struct MemoryWriter {
    outbound: Sender<Frame>,
    shared: Arc<Shared>,
}

impl MemorySocket {
    /// Two connected ends.
    #[must_use]
    pub fn pair() -> (MemorySocket, MemorySocket) {
        let (a_tx, a_rx) = unbounded();
        let (b_tx, b_rx) = unbounded();
        let a_addr = SocketAddr::from((Ipv4Addr::LOCALHOST, 50_001));
        let b_addr = SocketAddr::from((Ipv4Addr::LOCALHOST, 443));

        let a = MemorySocket::end(a_rx, b_tx.clone(), a_tx.clone(), a_addr, b_addr);
        let b = MemorySocket::end(b_rx, a_tx, b_tx, b_addr, a_addr);
        (a, b)
    }

    /// A pair whose first end reports unconnected until `connect` is called.
    #[must_use]
    pub fn pending_pair() -> (MemorySocket, MemorySocket) {
        let (mut client, server) = MemorySocket::pair();
        client.connected = false;
        (client, server)
    }

    /// An unconnected end whose `connect` always fails with `ConnectionRefused`.
    #[must_use]
    pub fn refusing() -> MemorySocket {
        let (mut client, _server) = MemorySocket::pending_pair();
        client.refuse_connect = true;
        client
    }

    fn end(
        inbound: Receiver<Frame>,
        outbound: Sender<Frame>,
        wake: Sender<Frame>,
        local: SocketAddr,
        peer: SocketAddr,
    ) -> MemorySocket {
        let shared = Arc::new(Shared {
            read_timeout: Mutex::new(None),
            shut_down: AtomicBool::new(false),
            shutdown_calls: AtomicUsize::new(0),
            local,
            peer,
        });
        MemorySocket {
            reader: MemoryReader {
                inbound,
                pending: Bytes::new(),
                eof: false,
                shared: Arc::clone(&shared),
            },
            writer: MemoryWriter {
                outbound,
                shared: Arc::clone(&shared),
            },
            wake,
            connected: true,
            refuse_connect: false,
            shared,
        }
    }

    /// Observer of this end's shutdown activity.
    #[must_use]
    pub fn probe(&self) -> MemoryProbe {
        MemoryProbe {
            shared: Arc::clone(&self.shared),
        }
    }

    fn check_connected(&self) -> io::Result<()> {
        if self.connected {
            Ok(())
        } else {
            Err(io::Error::new(io::ErrorKind::NotConnected, "memory socket not connected"))
        }
    }
}

impl Shared {
    fn check_open(&self) -> io::Result<()> {
        if self.shut_down.load(Ordering::Acquire) {
            return Err(io::Error::new(io::ErrorKind::ConnectionAborted, "memory socket shut down"));
        }
        Ok(())
    }

    fn current_timeout(&self) -> Option<Duration> {
        self.read_timeout.lock().map_or(None, |timeout| *timeout)
    }
}

impl Read for MemoryReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.shared.check_open()?;

        while self.pending.is_empty() {
            if self.eof {
                return Ok(0);
            }
            let frame = match self.shared.current_timeout() {
                Some(timeout) => match self.inbound.recv_timeout(timeout) {
                    Ok(frame) => frame,
                    Err(RecvTimeoutError::Timeout) => {
                        return Err(io::Error::new(
                            io::ErrorKind::TimedOut,
                            "memory socket read timed out",
                        ));
                    }
                    Err(RecvTimeoutError::Disconnected) => return Ok(0),
                },
                None => match self.inbound.recv() {
                    Ok(frame) => frame,
                    Err(_) => return Ok(0),
                },
            };

            match frame {
                Frame::Data(bytes) => self.pending = bytes,
                Frame::Eof => self.eof = true,
                Frame::Wake => self.shared.check_open()?,
            }
        }

        let n = buf.len().min(self.pending.len());
        buf[..n].copy_from_slice(&self.pending[..n]);
        self.pending.advance(n);
        Ok(n)
    }
}

impl Write for MemoryWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.shared.check_open()?;
        if buf.is_empty() {
            return Ok(0);
        }
        self.outbound
            .send(Frame::Data(Bytes::copy_from_slice(buf)))
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "memory peer dropped"))?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.shared.check_open()
    }
}

impl Drop for MemoryWriter {
    fn drop(&mut self) {
        // The reading end keeps its own wake sender alive, so disconnection
        // alone would never reach the peer.
        let _ = self.outbound.send(Frame::Eof);
    }
}

impl Read for MemorySocket {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.check_connected()?;
        self.reader.read(buf)
    }
}

impl Write for MemorySocket {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.check_connected()?;
        self.writer.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.check_connected()?;
        self.writer.flush()
    }
}

impl RawSocket for MemorySocket {
    fn is_connected(&self) -> bool {
        self.connected
    }

    fn connect(&mut self, host: &str, port: u16, _timeout: Option<Duration>) -> io::Result<()> {
        if self.refuse_connect {
            return Err(io::Error::new(
                io::ErrorKind::ConnectionRefused,
                format!("memory transport refused {host}:{port}"),
            ));
        }
        if self.connected {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                "memory socket already connected",
            ));
        }
        self.connected = true;
        Ok(())
    }

    fn bind(&mut self, _local: SocketAddr) -> io::Result<()> {
        Err(io::Error::new(io::ErrorKind::Unsupported, "memory sockets cannot be bound"))
    }

    fn set_read_timeout(&mut self, timeout: Option<Duration>) -> io::Result<()> {
        let mut slot = self
            .shared
            .read_timeout
            .lock()
            .map_err(|_| io::Error::other("read timeout lock poisoned"))?;
        *slot = timeout;
        Ok(())
    }

    fn control(&self) -> io::Result<Arc<dyn RawControl>> {
        self.check_connected()?;
        Ok(Arc::new(MemoryControl {
            shared: Arc::clone(&self.shared),
            outbound: self.writer.outbound.clone(),
            wake: self.wake.clone(),
        }))
    }

    fn split(self: Box<Self>) -> io::Result<(RawReader, RawWriter)> {
        self.check_connected()?;
        let MemorySocket { reader, writer, .. } = *self;
        Ok((Box::new(reader), Box::new(writer)))
    }
}

#[derive(Debug)]
struct MemoryControl {
    shared: Arc<Shared>,
    outbound: Sender<Frame>,
    wake: Sender<Frame>,
}

impl RawControl for MemoryControl {
    fn set_read_timeout(&self, timeout: Option<Duration>) -> io::Result<()> {
        let mut slot = self
            .shared
            .read_timeout
            .lock()
            .map_err(|_| io::Error::other("read timeout lock poisoned"))?;
        *slot = timeout;
        Ok(())
    }

    fn read_timeout(&self) -> io::Result<Option<Duration>> {
        self.shared
            .read_timeout
            .lock()
            .map(|timeout| *timeout)
            .map_err(|_| io::Error::other("read timeout lock poisoned"))
    }

    fn peer_addr(&self) -> io::Result<SocketAddr> {
        Ok(self.shared.peer)
    }

    fn local_addr(&self) -> io::Result<SocketAddr> {
        Ok(self.shared.local)
    }

    fn shutdown(&self) -> io::Result<()> {
        self.shared.shutdown_calls.fetch_add(1, Ordering::AcqRel);
        if !self.shared.shut_down.swap(true, Ordering::AcqRel) {
            // Either side may already be gone; shutdown still succeeds.
            let _ = self.outbound.send(Frame::Eof);
            let _ = self.wake.send(Frame::Wake);
        }
        Ok(())
    }
}

/// Read-only view of one memory end's shutdown state.
#[derive(Debug, Clone)]
pub struct MemoryProbe {
    shared: Arc<Shared>,
}

impl MemoryProbe {
    /// Number of times `RawControl::shutdown` was invoked on this end.
    #[must_use]
    pub fn shutdown_calls(&self) -> usize {
        self.shared.shutdown_calls.load(Ordering::Acquire)
    }

    #[must_use]
    pub fn is_shut_down(&self) -> bool {
        self.shared.shut_down.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Instant;

    #[test]
    fn bytes_arrive_in_order() {
        let (mut a, mut b) = MemorySocket::pair();
        a.write_all(b"hello ").unwrap();
        a.write_all(b"world").unwrap();

        let mut buf = [0u8; 11];
        b.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"hello world");
    }

    #[test]
    fn read_timeout_fires() {
        let (_a, mut b) = MemorySocket::pair();
        b.set_read_timeout(Some(Duration::from_millis(50))).unwrap();

        let started = Instant::now();
        let err = b.read(&mut [0u8; 8]).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::TimedOut);
        assert!(started.elapsed() >= Duration::from_millis(50));
    }

    #[test]
    fn shutdown_wakes_blocked_reader() {
        let (_a, mut b) = MemorySocket::pair();
        let control = b.control().unwrap();
        let probe = b.probe();

        let reader = thread::spawn(move || b.read(&mut [0u8; 8]));
        thread::sleep(Duration::from_millis(50));
        control.shutdown().unwrap();

        let result = reader.join().unwrap();
        assert_eq!(result.unwrap_err().kind(), io::ErrorKind::ConnectionAborted);
        assert_eq!(probe.shutdown_calls(), 1);
        assert!(probe.is_shut_down());
    }

    #[test]
    fn shutdown_signals_eof_to_peer() {
        let (a, mut b) = MemorySocket::pair();
        a.control().unwrap().shutdown().unwrap();
        assert_eq!(b.read(&mut [0u8; 8]).unwrap(), 0);
    }

    #[test]
    fn dropping_an_end_is_eof_for_the_peer() {
        let (mut a, b) = MemorySocket::pair();
        drop(b);
        assert_eq!(a.read(&mut [0u8; 8]).unwrap(), 0);
        assert_eq!(a.read(&mut [0u8; 8]).unwrap(), 0);
    }

    #[test]
    fn split_reader_blocks_without_holding_the_writer() {
        let (a, mut b) = MemorySocket::pair();
        let (mut reader, mut writer) = Box::new(a).split().unwrap();

        let blocked = thread::spawn(move || {
            let mut buf = [0u8; 4];
            reader.read_exact(&mut buf).map(|()| buf)
        });
        thread::sleep(Duration::from_millis(50));
        writer.write_all(b"ping").unwrap();

        let mut buf = [0u8; 4];
        b.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"ping");
        b.write_all(b"pong").unwrap();
        assert_eq!(&blocked.join().unwrap().unwrap(), b"pong");
    }

    #[test]
    fn dropping_split_writer_is_eof_for_the_peer() {
        let (a, mut b) = MemorySocket::pair();
        let (_reader, writer) = Box::new(a).split().unwrap();
        drop(writer);
        assert_eq!(b.read(&mut [0u8; 8]).unwrap(), 0);
    }

    #[test]
    fn pending_end_connects_once() {
        let (mut client, _server) = MemorySocket::pending_pair();
        assert!(!client.is_connected());
        assert!(client.control().is_err());

        client.connect("amazing.today", 443, None).unwrap();
        assert!(client.is_connected());
        assert_eq!(
            client.connect("amazing.today", 443, None).unwrap_err().kind(),
            io::ErrorKind::AlreadyExists
        );
    }

    #[test]
    fn refusing_end_never_connects() {
        let mut socket = MemorySocket::refusing();
        let err = socket.connect("amazing.today", 443, None).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::ConnectionRefused);
        assert!(!socket.is_connected());
    }
}
