//! Setter methods for `TlsRoute`

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tlsroute_client::{HandshakeObserver, MatchStrategy, SocketFactory, TlsVersion};

use super::core::{Hosts, TlsRoute};

impl TlsRoute {
    /// Replace the allow-list. Entries are validated by `build`.
    #[must_use]
    pub fn upgrade_hosts<I, S>(mut self, hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.hosts = Hosts::List(hosts.into_iter().map(Into::into).collect());
        self
    }

    /// Upgrade every host-named connection.
    #[must_use]
    pub fn upgrade_all(mut self) -> Self {
        self.hosts = Hosts::All;
        self
    }

    #[must_use]
    pub fn match_strategy(mut self, strategy: MatchStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Protocol version forced on upgraded connections.
    #[must_use]
    pub fn protocol(mut self, version: TlsVersion) -> Self {
        self.config.protocol = version;
        self
    }

    /// Shorthand for `protocol(TlsVersion::Tls12)`
    #[must_use]
    pub fn tls12(self) -> Self {
        self.protocol(TlsVersion::Tls12)
    }

    /// Shorthand for `protocol(TlsVersion::Tls13)`
    #[must_use]
    pub fn tls13(self) -> Self {
        self.protocol(TlsVersion::Tls13)
    }

    /// Read timeout for upgraded sockets; `Duration::ZERO` blocks indefinitely.
    #[must_use]
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.config.read_timeout = timeout;
        self
    }

    #[must_use]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = Some(timeout);
        self
    }

    /// Leave the raw connect unbounded apart from the platform limit.
    #[must_use]
    pub fn no_connect_timeout(mut self) -> Self {
        self.config.connect_timeout = None;
        self
    }

    /// Accept untrusted certificate chains on upgraded connections.
    #[must_use]
    pub fn trust_self_signed(mut self, trust: bool) -> Self {
        self.config.trust_self_signed = trust;
        self
    }

    /// Add the certificates in a PEM file to the upgraded path's trust roots.
    #[must_use]
    pub fn extra_root_cert(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.extra_root_certs.push(path.into());
        self
    }

    #[must_use]
    pub fn nodelay(mut self, nodelay: bool) -> Self {
        self.config.socket.nodelay = nodelay;
        self
    }

    #[must_use]
    pub fn keepalive(mut self, interval: Option<Duration>) -> Self {
        self.config.socket.keepalive = interval;
        self
    }

    /// Run `observer` once per established connection.
    #[must_use]
    pub fn observer(mut self, observer: HandshakeObserver) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Log every completed handshake at info level.
    #[must_use]
    pub fn debug(self) -> Self {
        self.observer(HandshakeObserver::logging())
    }

    /// Factory for connections that are not upgraded.
    #[must_use]
    pub fn delegate(mut self, delegate: Arc<dyn SocketFactory>) -> Self {
        self.delegate = Some(delegate);
        self
    }
}
