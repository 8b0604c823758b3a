//! Host-dispatching factory
//!
//! Each creation request is routed by the [`HostPolicy`]: allow-listed host
//! names get the upgraded path (forced protocol, restricted suites, optional
//! self-signed trust), everything else goes to the delegate verbatim.
//! Requests addressed by numeric IP always go to the delegate since the
//! policy works on host names.

use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use super::{HandshakeObserver, PlatformFactory, SocketFactory};
use crate::config::FactoryConfig;
use crate::connect::tcp::TcpSocketProvider;
use crate::connect::types::{RawSocket, RawSocketProvider, SecureSocket};
use crate::error::{self, Result};
use crate::policy::HostPolicy;
use crate::socket::{CIPHER_SUITES, EstablishOptions, TlsSocket};
use crate::tls::{HandshakeOptions, RustlsEngine, TlsEngine, add_pem_roots, bundled_roots};

/// Factory that upgrades allow-listed hosts and delegates the rest.
///
/// Configuration is fixed at construction. [`with_read_timeout`] and
/// [`with_self_signed_trust`] derive a new factory sharing the policy,
/// engine, transports and delegate.
///
/// [`with_read_timeout`]: DispatchingFactory::with_read_timeout
/// [`with_self_signed_trust`]: DispatchingFactory::with_self_signed_trust
#[derive(Debug, Clone)]
pub struct DispatchingFactory {
    policy: Arc<HostPolicy>,
    config: Arc<FactoryConfig>,
    engine: Arc<dyn TlsEngine>,
    sockets: Arc<dyn RawSocketProvider>,
    delegate: Arc<dyn SocketFactory>,
    observer: Option<HandshakeObserver>,
}

impl DispatchingFactory {
    /// Factory over TCP with the platform factory as delegate.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `config` is invalid or the trust
    /// roots cannot be loaded.
    pub fn new(policy: HostPolicy, config: FactoryConfig) -> Result<Self> {
        Self::builder(policy).config(config).build()
    }

    #[must_use]
    pub fn builder(policy: HostPolicy) -> DispatchingFactoryBuilder {
        DispatchingFactoryBuilder::new(policy)
    }

    #[must_use]
    pub fn policy(&self) -> &HostPolicy {
        &self.policy
    }

    #[must_use]
    pub fn config(&self) -> &FactoryConfig {
        &self.config
    }

    /// `true` when `host` would take the upgraded path.
    #[must_use]
    pub fn should_upgrade(&self, host: &str) -> bool {
        self.policy.should_upgrade(host)
    }

    /// Same factory with a different read timeout; `Duration::ZERO` disables it.
    #[must_use]
    pub fn with_read_timeout(&self, timeout: Duration) -> Self {
        let mut config = FactoryConfig::clone(&self.config);
        config.read_timeout = timeout;
        Self {
            config: Arc::new(config),
            ..self.clone()
        }
    }

    /// Same factory with self-signed trust switched on or off.
    #[must_use]
    pub fn with_self_signed_trust(&self, trust: bool) -> Self {
        let mut config = FactoryConfig::clone(&self.config);
        config.trust_self_signed = trust;
        Self {
            config: Arc::new(config),
            ..self.clone()
        }
    }

    fn establish_options(&self) -> EstablishOptions {
        EstablishOptions {
            read_timeout: self.config.read_timeout_option(),
            connect_timeout: self.config.connect_timeout,
            handshake: HandshakeOptions {
                trust_self_signed: self.config.trust_self_signed,
            },
        }
    }

    fn upgrade(
        &self,
        existing: Option<Box<dyn RawSocket>>,
        host: &str,
        port: u16,
    ) -> Result<Box<dyn SecureSocket>> {
        tracing::debug!("Upgrading connection to {}:{}", host, port);
        let raw = match existing {
            Some(raw) => raw,
            None => self
                .sockets
                .create()
                .map_err(|e| error::connect(e).with_target(host, port))?,
        };

        let socket = TlsSocket::new(host, port);
        socket.establish(raw, self.engine.as_ref(), &self.establish_options())?;
        Ok(self.observed(Box::new(socket)))
    }

    fn delegated(&self, created: Result<Box<dyn SecureSocket>>) -> Result<Box<dyn SecureSocket>> {
        created.map(|socket| self.observed(socket))
    }

    fn observed(&self, socket: Box<dyn SecureSocket>) -> Box<dyn SecureSocket> {
        if let Some(observer) = &self.observer
            && let Some(session) = socket.session()
        {
            observer.notify(session);
        }
        socket
    }
}

impl SocketFactory for DispatchingFactory {
    fn create_layered(
        &self,
        existing: Option<Box<dyn RawSocket>>,
        host: &str,
        port: u16,
        auto_close: bool,
    ) -> Result<Box<dyn SecureSocket>> {
        if !self.policy.should_upgrade(host) {
            tracing::debug!("Delegating {}:{}", host, port);
            return self.delegated(self.delegate.create_layered(existing, host, port, auto_close));
        }
        self.upgrade(existing, host, port)
    }

    fn create(&self, host: &str, port: u16) -> Result<Box<dyn SecureSocket>> {
        if !self.policy.should_upgrade(host) {
            tracing::debug!("Delegating {}:{}", host, port);
            return self.delegated(self.delegate.create(host, port));
        }
        self.upgrade(None, host, port)
    }

    fn create_with_addr(&self, addr: IpAddr, port: u16) -> Result<Box<dyn SecureSocket>> {
        self.delegated(self.delegate.create_with_addr(addr, port))
    }

    fn create_bound(
        &self,
        host: &str,
        port: u16,
        local_addr: IpAddr,
        local_port: u16,
    ) -> Result<Box<dyn SecureSocket>> {
        if self.policy.should_upgrade(host) {
            return Err(error::unsupported("local address binding on an upgraded connection")
                .with_target(host, port));
        }
        self.delegated(self.delegate.create_bound(host, port, local_addr, local_port))
    }

    fn create_with_addr_bound(
        &self,
        addr: IpAddr,
        port: u16,
        local_addr: IpAddr,
        local_port: u16,
    ) -> Result<Box<dyn SecureSocket>> {
        self.delegated(
            self.delegate
                .create_with_addr_bound(addr, port, local_addr, local_port),
        )
    }

    fn default_cipher_suites(&self) -> Vec<String> {
        CIPHER_SUITES.iter().map(ToString::to_string).collect()
    }

    fn supported_cipher_suites(&self) -> Vec<String> {
        CIPHER_SUITES.iter().map(ToString::to_string).collect()
    }
}

/// Assembles a [`DispatchingFactory`]. Unset parts get the TCP provider, a
/// rustls engine built from the configuration and the platform delegate.
#[derive(Debug)]
pub struct DispatchingFactoryBuilder {
    policy: HostPolicy,
    config: FactoryConfig,
    engine: Option<Arc<dyn TlsEngine>>,
    sockets: Option<Arc<dyn RawSocketProvider>>,
    delegate: Option<Arc<dyn SocketFactory>>,
    observer: Option<HandshakeObserver>,
}

impl DispatchingFactoryBuilder {
    #[must_use]
    pub fn new(policy: HostPolicy) -> Self {
        Self {
            policy,
            config: FactoryConfig::default(),
            engine: None,
            sockets: None,
            delegate: None,
            observer: None,
        }
    }

    #[must_use]
    pub fn config(mut self, config: FactoryConfig) -> Self {
        self.config = config;
        self
    }

    /// Engine for the upgraded path.
    #[must_use]
    pub fn engine(mut self, engine: Arc<dyn TlsEngine>) -> Self {
        self.engine = Some(engine);
        self
    }

    /// Source of fresh raw sockets for the upgraded path.
    #[must_use]
    pub fn sockets(mut self, sockets: Arc<dyn RawSocketProvider>) -> Self {
        self.sockets = Some(sockets);
        self
    }

    /// Factory receiving every request that is not upgraded.
    #[must_use]
    pub fn delegate(mut self, delegate: Arc<dyn SocketFactory>) -> Self {
        self.delegate = Some(delegate);
        self
    }

    #[must_use]
    pub fn observer(mut self, observer: HandshakeObserver) -> Self {
        self.observer = Some(observer);
        self
    }

    /// # Errors
    ///
    /// Returns a configuration error if the configuration is invalid, the
    /// extra roots cannot be read or the forced protocol has no suites.
    pub fn build(self) -> Result<DispatchingFactory> {
        self.config.validate().map_err(error::config)?;

        let engine = match self.engine {
            Some(engine) => engine,
            None => {
                let mut roots = bundled_roots();
                add_pem_roots(&mut roots, self.config.extra_root_certs.as_slice())
                    .map_err(error::config)?;
                let engine = RustlsEngine::forced(self.config.protocol, CIPHER_SUITES, roots)
                    .map_err(error::config)?;
                Arc::new(engine)
            }
        };

        let sockets = match self.sockets {
            Some(sockets) => sockets,
            None => Arc::new(TcpSocketProvider::new(self.config.socket.clone())),
        };

        let delegate = match self.delegate {
            Some(delegate) => delegate,
            None => Arc::new(PlatformFactory::new()?) as Arc<dyn SocketFactory>,
        };

        tracing::debug!(
            "Dispatching factory ready: {} allow-list entries, {}",
            self.policy.entries().len(),
            self.config.protocol
        );

        Ok(DispatchingFactory {
            policy: Arc::new(self.policy),
            config: Arc::new(self.config),
            engine,
            sockets,
            delegate,
            observer: self.observer,
        })
    }
}
