//! Core `TlsRoute` builder structure and finalization

use std::fmt;
use std::sync::Arc;

use tlsroute_client::{
    DEFAULT_UPGRADE_HOSTS, DispatchingFactory, FactoryConfig, HandshakeObserver, HostPolicy,
    MatchStrategy, SocketFactory,
};

use crate::config::RouteConfig;

/// Which hosts the built factory upgrades.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Hosts {
    /// The built-in allow-list
    Default,
    List(Vec<String>),
    /// Every named host, for factories applied to chosen connections only
    All,
}

/// Builder for a routing socket factory.
///
/// ```no_run
/// use std::time::Duration;
/// use tlsroute::{TlsRoute, TlsVersion};
///
/// let factory = TlsRoute::new()
///     .upgrade_hosts(["amazing.today", "vtov.studio"])
///     .protocol(TlsVersion::Tls12)
///     .read_timeout(Duration::from_secs(30))
///     .build()?;
/// # Ok::<(), tlsroute::Error>(())
/// ```
#[derive(Clone)]
pub struct TlsRoute {
    pub(crate) hosts: Hosts,
    pub(crate) strategy: MatchStrategy,
    pub(crate) config: FactoryConfig,
    pub(crate) observer: Option<HandshakeObserver>,
    pub(crate) delegate: Option<Arc<dyn SocketFactory>>,
}

impl TlsRoute {
    /// Builder with the built-in allow-list and default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self {
            hosts: Hosts::Default,
            strategy: MatchStrategy::default(),
            config: FactoryConfig::default(),
            observer: None,
            delegate: None,
        }
    }

    /// Builder that upgrades every host-named connection it is asked for.
    #[must_use]
    pub fn single_target() -> Self {
        Self::new().upgrade_all()
    }

    /// Builder seeded from a loaded [`RouteConfig`].
    #[must_use]
    pub fn from_config(config: &RouteConfig) -> Self {
        let mut route = Self::new()
            .match_strategy(config.match_strategy)
            .protocol(config.protocol)
            .read_timeout(config.read_timeout())
            .trust_self_signed(config.trust_self_signed);

        if let Some(timeout) = config.connect_timeout() {
            route = route.connect_timeout(timeout);
        }
        if let Some(hosts) = &config.upgrade_hosts {
            route = route.upgrade_hosts(hosts.iter().cloned());
        }
        for path in &config.extra_root_certs {
            route = route.extra_root_cert(path.clone());
        }
        route
    }

    /// Finalize into a factory.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for invalid allow-list entries or
    /// settings, or if the trust roots cannot be loaded.
    pub fn build(self) -> tlsroute_client::Result<DispatchingFactory> {
        let policy = match self.hosts {
            Hosts::Default => {
                HostPolicy::with_strategy(DEFAULT_UPGRADE_HOSTS.iter().copied(), self.strategy)?
            }
            Hosts::List(entries) => HostPolicy::with_strategy(entries, self.strategy)?,
            Hosts::All => HostPolicy::always(),
        };

        tracing::debug!("Building route factory with {:?}", policy);

        let mut builder = DispatchingFactory::builder(policy).config(self.config);
        if let Some(observer) = self.observer {
            builder = builder.observer(observer);
        }
        if let Some(delegate) = self.delegate {
            builder = builder.delegate(delegate);
        }
        builder.build()
    }
}

impl Default for TlsRoute {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TlsRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TlsRoute")
            .field("hosts", &self.hosts)
            .field("strategy", &self.strategy)
            .field("config", &self.config)
            .field("observer", &self.observer.is_some())
            .field("delegate", &self.delegate)
            .finish()
    }
}
