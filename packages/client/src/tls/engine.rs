//! TLS engine boundary
//!
//! [`TlsEngine`] takes a connected raw transport and returns the secure
//! duplex stream plus session metadata once the client handshake finished.
//! [`RustlsEngine`] implements it on top of rustls with the ring provider,
//! whose `secure_random` seeds every handshake.

use std::io::{self, Read, Write};
use std::sync::{Arc, Mutex, MutexGuard, TryLockError};

use rustls::crypto::CryptoProvider;
use rustls::pki_types::ServerName;
use rustls::{ClientConfig, ClientConnection, ProtocolVersion, RootCertStore, StreamOwned};
use rustls::{SupportedCipherSuite, SupportedProtocolVersion};

use super::errors::TlsError;
use super::verifier::SelfSignedTrust;
use crate::config::{ConfigurationError, TlsVersion};
use crate::connect::types::{RawReader, RawSocket, RawWriter, SecureStream, SessionMetadata};

/// Per-handshake switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HandshakeOptions {
    /// Accept certificates that fail chain validation
    pub trust_self_signed: bool,
}

/// Output of a completed client handshake.
pub struct EngineSession {
    pub stream: Box<dyn SecureStream>,
    pub metadata: SessionMetadata,
}

impl std::fmt::Debug for EngineSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineSession")
            .field("metadata", &self.metadata)
            .finish_non_exhaustive()
    }
}

/// Drives a client handshake over a connected raw transport.
pub trait TlsEngine: Send + Sync + std::fmt::Debug {
    /// # Errors
    ///
    /// Returns a `TlsError` if the server name is invalid or the exchange fails.
    /// The raw socket is consumed either way.
    fn handshake(
        &self,
        raw: Box<dyn RawSocket>,
        host: &str,
        options: &HandshakeOptions,
    ) -> Result<EngineSession, TlsError>;

    /// IANA names of the cipher suites this engine may negotiate.
    fn cipher_suites(&self) -> Vec<String>;
}

/// rustls-backed engine with a fixed protocol and root set.
#[derive(Debug, Clone)]
pub struct RustlsEngine {
    strict: Arc<ClientConfig>,
    trusting: Arc<ClientConfig>,
    suites: Vec<String>,
}

impl RustlsEngine {
    /// Engine that negotiates `version` only, limited to `allowed_suites`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::NoCipherSuites` if none of the allowed
    /// suites belong to `version`, or `RootCertificates` if `roots` is empty.
    pub fn forced(
        version: TlsVersion,
        allowed_suites: &[&str],
        roots: RootCertStore,
    ) -> Result<Self, ConfigurationError> {
        let mut provider = rustls::crypto::ring::default_provider();
        provider
            .cipher_suites
            .retain(|suite| allowed_suites.contains(&suite_name(suite).as_str()));

        let wanted = version.rustls_version();
        let usable = provider
            .cipher_suites
            .iter()
            .any(|suite| suite.version().version == wanted.version);
        if !usable {
            return Err(ConfigurationError::NoCipherSuites(version));
        }

        Self::build(Arc::new(provider), &[wanted], roots).map_err(|e| match e {
            TlsError::Verifier(e) => ConfigurationError::RootCertificates(e.to_string()),
            _ => ConfigurationError::NoCipherSuites(version),
        })
    }

    /// Engine with rustls defaults: every supported version and suite.
    ///
    /// # Errors
    ///
    /// Returns an error if the verifier cannot be built from `roots`.
    pub fn platform(roots: RootCertStore) -> Result<Self, TlsError> {
        Self::build(
            Arc::new(rustls::crypto::ring::default_provider()),
            rustls::DEFAULT_VERSIONS,
            roots,
        )
    }

    fn build(
        provider: Arc<CryptoProvider>,
        versions: &[&'static SupportedProtocolVersion],
        roots: RootCertStore,
    ) -> Result<Self, TlsError> {
        let roots = Arc::new(roots);
        let suites = provider.cipher_suites.iter().map(suite_name).collect();

        let strict = ClientConfig::builder_with_provider(Arc::clone(&provider))
            .with_protocol_versions(versions)?
            .with_root_certificates(Arc::clone(&roots))
            .with_no_client_auth();

        let verifier = SelfSignedTrust::new(roots, Arc::clone(&provider))?;
        let trusting = ClientConfig::builder_with_provider(provider)
            .with_protocol_versions(versions)?
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(verifier))
            .with_no_client_auth();

        Ok(Self {
            strict: Arc::new(strict),
            trusting: Arc::new(trusting),
            suites,
        })
    }
}

impl TlsEngine for RustlsEngine {
    fn handshake(
        &self,
        raw: Box<dyn RawSocket>,
        host: &str,
        options: &HandshakeOptions,
    ) -> Result<EngineSession, TlsError> {
        let server_name = ServerName::try_from(host.to_owned())
            .map_err(|_| TlsError::InvalidServerName(host.to_owned()))?;

        let config = if options.trust_self_signed {
            Arc::clone(&self.trusting)
        } else {
            Arc::clone(&self.strict)
        };

        let conn = ClientConnection::new(config, server_name)?;
        let mut stream = StreamOwned::new(conn, raw);

        while stream.conn.is_handshaking() {
            match stream.conn.complete_io(&mut stream.sock) {
                Ok((0, 0)) => return Err(TlsError::Eof),
                Ok(_) => {}
                Err(e) => return Err(TlsError::from_handshake_io(e)),
            }
        }

        let protocol = stream
            .conn
            .protocol_version()
            .map_or_else(|| "unknown".to_owned(), protocol_name);
        let cipher_suite = stream
            .conn
            .negotiated_cipher_suite()
            .map_or_else(|| "unknown".to_owned(), |suite| suite_name(&suite));

        let StreamOwned { conn, sock } = stream;
        let (reader, writer) = sock.split()?;

        Ok(EngineSession {
            stream: Box::new(RustlsStream::new(conn, reader, writer)),
            metadata: SessionMetadata::new(host, protocol, cipher_suite),
        })
    }

    fn cipher_suites(&self) -> Vec<String> {
        self.suites.clone()
    }
}

/// Ciphertext read from the transport per pass.
const RECORD_CHUNK: usize = 16 * 1024;

/// Established rustls session over a split transport.
///
/// The connection lock is only held while records are decrypted or
/// encrypted, never across transport I/O. Lock order is inbound, then
/// writer, then connection.
struct RustlsStream {
    conn: Mutex<ClientConnection>,
    inbound: Mutex<Inbound>,
    writer: Mutex<RawWriter>,
}

struct Inbound {
    raw: RawReader,
    chunk: Box<[u8]>,
}

impl RustlsStream {
    fn new(conn: ClientConnection, reader: RawReader, writer: RawWriter) -> Self {
        Self {
            conn: Mutex::new(conn),
            inbound: Mutex::new(Inbound {
                raw: reader,
                chunk: vec![0u8; RECORD_CHUNK].into_boxed_slice(),
            }),
            writer: Mutex::new(writer),
        }
    }

    fn conn(&self) -> io::Result<MutexGuard<'_, ClientConnection>> {
        lock(&self.conn)
    }

    /// Send whatever records the connection has queued, e.g. an alert or a
    /// key update reply produced while reading.
    fn send_queued(&self, writer: &mut RawWriter) -> io::Result<()> {
        let records = drain_records(&mut *self.conn()?)?;
        writer.write_all(&records)?;
        writer.flush()
    }
}

impl SecureStream for RustlsStream {
    fn read(&self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }

        let mut inbound = lock(&self.inbound)?;
        let Inbound { raw, chunk } = &mut *inbound;
        loop {
            match self.conn()?.reader().read(buf) {
                Ok(n) => return Ok(n),
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {}
                Err(e) => return Err(e),
            }

            let n = raw.read(&mut chunk[..])?;
            let (fed, reply) = {
                let mut conn = self.conn()?;
                let fed = feed_records(&mut conn, &chunk[..n]);
                (fed, conn.wants_write())
            };

            if let Err(e) = fed {
                // Best effort: the alert describing the failure
                if let Ok(mut writer) = self.writer.try_lock() {
                    let _ = self.send_queued(&mut writer);
                }
                return Err(e);
            }
            if reply {
                self.send_queued(&mut *lock(&self.writer)?)?;
            }
        }
    }

    fn write(&self, buf: &[u8]) -> io::Result<usize> {
        let mut writer = lock(&self.writer)?;
        let (n, records) = {
            let mut conn = self.conn()?;
            let n = conn.writer().write(buf)?;
            (n, drain_records(&mut conn)?)
        };
        writer.write_all(&records)?;
        Ok(n)
    }

    fn flush(&self) -> io::Result<()> {
        let mut writer = lock(&self.writer)?;
        let records = {
            let mut conn = self.conn()?;
            conn.writer().flush()?;
            drain_records(&mut conn)?
        };
        writer.write_all(&records)?;
        writer.flush()
    }

    fn close_notify(&self) -> io::Result<()> {
        let mut writer = match self.writer.try_lock() {
            Ok(writer) => writer,
            Err(TryLockError::WouldBlock) => return Ok(()),
            Err(TryLockError::Poisoned(_)) => return Err(poisoned()),
        };
        self.conn()?.send_close_notify();
        self.send_queued(&mut writer)
    }
}

/// Hand `records` to the connection and decrypt them. An empty slice
/// reports transport EOF.
fn feed_records(conn: &mut ClientConnection, mut records: &[u8]) -> io::Result<()> {
    loop {
        let eof = records.is_empty();
        let taken = conn.read_tls(&mut records)?;
        conn.process_new_packets()
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        if eof || records.is_empty() || taken == 0 {
            return Ok(());
        }
    }
}

fn drain_records(conn: &mut ClientConnection) -> io::Result<Vec<u8>> {
    let mut records = Vec::new();
    while conn.wants_write() {
        conn.write_tls(&mut records)?;
    }
    Ok(records)
}

fn lock<T>(mutex: &Mutex<T>) -> io::Result<MutexGuard<'_, T>> {
    mutex.lock().map_err(|_| poisoned())
}

fn poisoned() -> io::Error {
    io::Error::other("tls stream lock poisoned")
}

/// IANA name of a cipher suite, e.g. `TLS_ECDHE_RSA_WITH_AES_128_GCM_SHA256`.
pub(crate) fn suite_name(suite: &SupportedCipherSuite) -> String {
    format!("{:?}", suite.suite())
}

fn protocol_name(version: ProtocolVersion) -> String {
    match version {
        ProtocolVersion::TLSv1_2 => "TLSv1.2".to_owned(),
        ProtocolVersion::TLSv1_3 => "TLSv1.3".to_owned(),
        other => format!("{other:?}"),
    }
}
