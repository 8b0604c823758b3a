use std::error::Error as StdError;
use std::fmt;

/// A Result alias where the Err case is `tlsroute_client::Error`.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents errors that can occur while creating or using a routed socket.
pub struct Error {
    pub(crate) inner: Box<Inner>,
}

pub(crate) struct Inner {
    pub(crate) kind: Kind,
    pub(crate) source: Option<Box<dyn StdError + Send + Sync>>,
    pub(crate) target: Option<Target>,
}

/// Host and port the failing operation was aimed at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub host: String,
    pub port: u16,
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    /// Malformed allow-list entry or invalid configuration value
    Config,
    /// Raw socket could not be created, resolved or connected
    Connect,
    /// The host was reached but the TLS exchange failed
    Handshake,
    /// The requested combination has no implementation on the upgrade path
    Unsupported,
    /// Operation attempted on a closed or failed socket
    Closed,
}

impl Error {
    pub fn new(kind: Kind) -> Error {
        Error {
            inner: Box::new(Inner {
                kind,
                source: None,
                target: None,
            }),
        }
    }

    #[must_use = "Error builder methods return a new Error and should be used"]
    pub fn with<E: Into<Box<dyn StdError + Send + Sync>>>(mut self, source: E) -> Error {
        self.inner.source = Some(source.into());
        self
    }

    #[must_use = "Error builder methods return a new Error and should be used"]
    pub fn with_target(mut self, host: &str, port: u16) -> Error {
        self.inner.target = Some(Target {
            host: host.to_owned(),
            port,
        });
        self
    }

    #[must_use]
    pub fn kind(&self) -> Kind {
        self.inner.kind
    }

    /// Get the host and port associated with this error, if any
    #[must_use]
    pub fn target(&self) -> Option<&Target> {
        self.inner.target.as_ref()
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut f = f.debug_struct("tlsroute::Error");

        f.field("kind", &self.inner.kind);

        if let Some(ref source) = self.inner.source {
            f.field("source", source);
        }

        if let Some(ref target) = self.inner.target {
            f.field("target", target);
        }

        f.finish()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.inner.kind {
            Kind::Config => f.write_str("invalid configuration")?,
            Kind::Connect => f.write_str("connection error")?,
            Kind::Handshake => f.write_str("TLS handshake failed")?,
            Kind::Unsupported => f.write_str("operation not supported")?,
            Kind::Closed => f.write_str("socket not usable")?,
        }

        if let Some(ref target) = self.inner.target {
            write!(f, " ({target})")?;
        }

        if let Some(ref source) = self.inner.source {
            write!(f, ": {source}")?;
        }

        Ok(())
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.inner
            .source
            .as_ref()
            .map(|err| &**err as &(dyn StdError + 'static))
    }
}
