//! Shared fixtures: rcgen certificates, a rustls echo peer over memory or
//! loopback TCP, and counting doubles for the factory seams.

#![allow(dead_code)]

use std::io::{self, Read, Write};
use std::net::{IpAddr, SocketAddr, TcpListener, TcpStream};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use rcgen::{BasicConstraints, CertificateParams, DnType, IsCa, Issuer, KeyPair};
use rustls::pki_types::{CertificateDer, PrivateKeyDer, PrivatePkcs8KeyDer};
use rustls::{ServerConfig, ServerConnection, StreamOwned};

use tlsroute_client::error::Result;
use tlsroute_client::tls::{EngineSession, HandshakeOptions, TlsError};
use tlsroute_client::{
    MemoryProbe, MemorySocket, RawSocket, RawSocketProvider, SecureSocket, SessionMetadata,
    SocketFactory, TlsEngine,
};

pub const PEER_HOSTS: &[&str] = &["amazing.today", "vtov.studio", "localhost"];

/// CA-issued leaf certificate for [`PEER_HOSTS`].
pub struct TestPki {
    pub ca_der: CertificateDer<'static>,
    pub ca_pem: String,
    pub chain: Vec<CertificateDer<'static>>,
    pub key: PrivatePkcs8KeyDer<'static>,
}

impl TestPki {
    pub fn generate() -> Self {
        let mut ca_params = CertificateParams::new(Vec::<String>::new()).unwrap();
        ca_params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
        ca_params
            .distinguished_name
            .push(DnType::CommonName, "tlsroute test CA");
        let ca_key = KeyPair::generate().unwrap();
        let ca_cert = ca_params.self_signed(&ca_key).unwrap();
        let ca_der = CertificateDer::from(ca_cert.der().to_vec());
        let ca_pem = ca_cert.pem();
        let issuer = Issuer::new(ca_params, ca_key);

        let hosts: Vec<String> = PEER_HOSTS.iter().map(ToString::to_string).collect();
        let leaf_params = CertificateParams::new(hosts).unwrap();
        let leaf_key = KeyPair::generate().unwrap();
        let leaf = leaf_params.signed_by(&leaf_key, &issuer).unwrap();

        Self {
            chain: vec![CertificateDer::from(leaf.der().to_vec()), ca_der.clone()],
            ca_der,
            ca_pem,
            key: PrivatePkcs8KeyDer::from(leaf_key.serialize_der()),
        }
    }

    /// Server config offering only the given protocol versions.
    pub fn server_config(
        &self,
        versions: &[&'static rustls::SupportedProtocolVersion],
    ) -> Arc<ServerConfig> {
        let config = ServerConfig::builder_with_provider(Arc::new(
            rustls::crypto::ring::default_provider(),
        ))
        .with_protocol_versions(versions)
        .unwrap()
        .with_no_client_auth()
        .with_single_cert(self.chain.clone(), PrivateKeyDer::from(self.key.clone_key()))
        .unwrap();
        Arc::new(config)
    }

    /// Write the CA certificate to a fresh PEM file.
    pub fn write_ca_pem(&self) -> PathBuf {
        static NEXT: AtomicUsize = AtomicUsize::new(0);
        let path = std::env::temp_dir().join(format!(
            "tlsroute-ca-{}-{}.pem",
            std::process::id(),
            NEXT.fetch_add(1, Ordering::SeqCst)
        ));
        std::fs::write(&path, &self.ca_pem).unwrap();
        path
    }
}

/// Run a TLS echo peer on `transport` until the client hangs up.
pub fn serve_echo<S: Read + Write + Send + 'static>(
    config: Arc<ServerConfig>,
    transport: S,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let Ok(conn) = ServerConnection::new(config) else {
            return;
        };
        let mut stream = StreamOwned::new(conn, transport);
        let mut buf = [0u8; 1024];
        loop {
            match stream.read(&mut buf) {
                Ok(0) | Err(_) => break,
                Ok(n) => {
                    if stream.write_all(&buf[..n]).and_then(|()| stream.flush()).is_err() {
                        break;
                    }
                }
            }
        }
        stream.conn.send_close_notify();
        let _ = stream.flush();
    })
}

/// Loopback TCP echo peer accepting a single connection.
pub fn tcp_echo_server(config: Arc<ServerConfig>) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    thread::spawn(move || {
        if let Ok((stream, _)) = listener.accept() {
            let _ = serve_echo(config, stream).join();
        }
    });
    addr
}

/// Loopback TCP peer that completes the handshake and then never reads, so
/// the client's writes eventually block on a full send buffer.
pub fn stalled_tls_server(config: Arc<ServerConfig>) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    thread::spawn(move || {
        let Ok((mut stream, _)) = listener.accept() else {
            return;
        };
        let Ok(mut conn) = ServerConnection::new(config) else {
            return;
        };
        while conn.is_handshaking() {
            if conn.complete_io(&mut stream).is_err() {
                return;
            }
        }
        while conn.wants_write() {
            if conn.write_tls(&mut stream).is_err() {
                return;
            }
        }
        thread::sleep(Duration::from_secs(30));
    });
    addr
}

/// Loopback TCP peer that accepts and then stays silent.
pub fn silent_tcp_server() -> (SocketAddr, thread::JoinHandle<Option<TcpStream>>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = thread::spawn(move || listener.accept().ok().map(|(stream, _)| stream));
    (addr, handle)
}

/// Provider handing out memory sockets whose peer runs a TLS echo server.
#[derive(Debug)]
pub struct EchoSockets {
    config: Arc<ServerConfig>,
    created: AtomicUsize,
    probes: Mutex<Vec<MemoryProbe>>,
}

impl EchoSockets {
    pub fn new(config: Arc<ServerConfig>) -> Arc<Self> {
        Arc::new(Self {
            config,
            created: AtomicUsize::new(0),
            probes: Mutex::new(Vec::new()),
        })
    }

    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    pub fn probes(&self) -> Vec<MemoryProbe> {
        self.probes.lock().unwrap().clone()
    }
}

impl RawSocketProvider for EchoSockets {
    fn create(&self) -> io::Result<Box<dyn RawSocket>> {
        self.created.fetch_add(1, Ordering::SeqCst);
        let (client, server) = MemorySocket::pending_pair();
        self.probes.lock().unwrap().push(client.probe());
        serve_echo(Arc::clone(&self.config), server);
        Ok(Box::new(client))
    }
}

/// Provider whose sockets always refuse to connect.
#[derive(Debug, Default)]
pub struct RefusingSockets;

impl RawSocketProvider for RefusingSockets {
    fn create(&self) -> io::Result<Box<dyn RawSocket>> {
        Ok(Box::new(MemorySocket::refusing()))
    }
}

/// Engine wrapper counting handshakes.
#[derive(Debug)]
pub struct CountingEngine {
    inner: Arc<dyn TlsEngine>,
    calls: AtomicUsize,
}

impl CountingEngine {
    pub fn new(inner: Arc<dyn TlsEngine>) -> Arc<Self> {
        Arc::new(Self {
            inner,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl TlsEngine for CountingEngine {
    fn handshake(
        &self,
        raw: Box<dyn RawSocket>,
        host: &str,
        options: &HandshakeOptions,
    ) -> std::result::Result<EngineSession, TlsError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.handshake(raw, host, options)
    }

    fn cipher_suites(&self) -> Vec<String> {
        self.inner.cipher_suites()
    }
}

/// Socket handed back by [`RecordingDelegate`].
#[derive(Debug)]
pub struct StubSocket {
    session: SessionMetadata,
}

impl SecureSocket for StubSocket {
    fn recv(&self, _buf: &mut [u8]) -> io::Result<usize> {
        Ok(0)
    }

    fn send(&self, buf: &[u8]) -> io::Result<usize> {
        Ok(buf.len())
    }

    fn flush_output(&self) -> io::Result<()> {
        Ok(())
    }

    fn is_connected(&self) -> bool {
        true
    }

    fn is_closed(&self) -> bool {
        false
    }

    fn peer_addr(&self) -> io::Result<SocketAddr> {
        Err(io::Error::from(io::ErrorKind::NotConnected))
    }

    fn local_addr(&self) -> io::Result<SocketAddr> {
        Err(io::Error::from(io::ErrorKind::NotConnected))
    }

    fn read_timeout(&self) -> io::Result<Option<Duration>> {
        Ok(None)
    }

    fn set_read_timeout(&self, _timeout: Option<Duration>) -> io::Result<()> {
        Ok(())
    }

    fn session(&self) -> Option<&SessionMetadata> {
        Some(&self.session)
    }

    fn close(&self) -> io::Result<()> {
        Ok(())
    }
}

/// One call received by the delegate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DelegateCall {
    pub entry: &'static str,
    pub host: String,
    pub port: u16,
    pub local: Option<(IpAddr, u16)>,
    pub had_existing: bool,
    pub auto_close: Option<bool>,
}

/// Delegate factory recording every call and answering with a stub socket.
#[derive(Debug, Default)]
pub struct RecordingDelegate {
    calls: Mutex<Vec<DelegateCall>>,
}

impl RecordingDelegate {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self) -> Vec<DelegateCall> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: DelegateCall) -> Result<Box<dyn SecureSocket>> {
        let session = SessionMetadata::new(&call.host, "TLSv1.3", "TLS13_AES_128_GCM_SHA256");
        self.calls.lock().unwrap().push(call);
        Ok(Box::new(StubSocket { session }))
    }
}

impl SocketFactory for RecordingDelegate {
    fn create_layered(
        &self,
        existing: Option<Box<dyn RawSocket>>,
        host: &str,
        port: u16,
        auto_close: bool,
    ) -> Result<Box<dyn SecureSocket>> {
        self.record(DelegateCall {
            entry: "create_layered",
            host: host.to_owned(),
            port,
            local: None,
            had_existing: existing.is_some(),
            auto_close: Some(auto_close),
        })
    }

    fn create(&self, host: &str, port: u16) -> Result<Box<dyn SecureSocket>> {
        self.record(DelegateCall {
            entry: "create",
            host: host.to_owned(),
            port,
            local: None,
            had_existing: false,
            auto_close: None,
        })
    }

    fn create_with_addr(&self, addr: IpAddr, port: u16) -> Result<Box<dyn SecureSocket>> {
        self.record(DelegateCall {
            entry: "create_with_addr",
            host: addr.to_string(),
            port,
            local: None,
            had_existing: false,
            auto_close: None,
        })
    }

    fn create_bound(
        &self,
        host: &str,
        port: u16,
        local_addr: IpAddr,
        local_port: u16,
    ) -> Result<Box<dyn SecureSocket>> {
        self.record(DelegateCall {
            entry: "create_bound",
            host: host.to_owned(),
            port,
            local: Some((local_addr, local_port)),
            had_existing: false,
            auto_close: None,
        })
    }

    fn create_with_addr_bound(
        &self,
        addr: IpAddr,
        port: u16,
        local_addr: IpAddr,
        local_port: u16,
    ) -> Result<Box<dyn SecureSocket>> {
        self.record(DelegateCall {
            entry: "create_with_addr_bound",
            host: addr.to_string(),
            port,
            local: Some((local_addr, local_port)),
            had_existing: false,
            auto_close: None,
        })
    }

    fn default_cipher_suites(&self) -> Vec<String> {
        vec!["TLS13_AES_128_GCM_SHA256".to_owned()]
    }

    fn supported_cipher_suites(&self) -> Vec<String> {
        self.default_cipher_suites()
    }
}
