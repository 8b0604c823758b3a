//! Factory construction through the public builder and config loaders.

use std::time::Duration;

use tlsroute::{
    DEFAULT_UPGRADE_HOSTS, HandshakeObserver, MatchStrategy, RouteConfig, SocketFactory, TlsRoute,
    TlsVersion,
};

#[test]
fn default_factory_upgrades_builtin_hosts() {
    let factory = tlsroute::factory().unwrap();

    for host in DEFAULT_UPGRADE_HOSTS {
        assert!(factory.should_upgrade(host));
    }
    assert!(factory.should_upgrade("api.amazing.today"));
    assert!(!factory.should_upgrade("www.google.com"));
    assert!(!factory.should_upgrade(""));
    assert_eq!(factory.config().protocol, TlsVersion::Tls12);
}

#[test]
fn builder_settings_reach_the_factory() {
    let factory = TlsRoute::new()
        .upgrade_hosts(["internal.example"])
        .match_strategy(MatchStrategy::Suffix)
        .tls13()
        .read_timeout(Duration::from_secs(3))
        .connect_timeout(Duration::from_secs(4))
        .trust_self_signed(true)
        .nodelay(false)
        .debug()
        .build()
        .unwrap();

    assert!(factory.should_upgrade("svc.internal.example"));
    assert!(!factory.should_upgrade("internal.example.org"));
    assert!(!factory.should_upgrade("amazing.today"));

    let config = factory.config();
    assert_eq!(config.protocol, TlsVersion::Tls13);
    assert_eq!(config.read_timeout, Duration::from_secs(3));
    assert_eq!(config.connect_timeout, Some(Duration::from_secs(4)));
    assert!(config.trust_self_signed);
    assert!(!config.socket.nodelay);
}

#[test]
fn strategy_applies_to_builtin_hosts() {
    let factory = TlsRoute::new()
        .match_strategy(MatchStrategy::Exact)
        .build()
        .unwrap();

    assert!(factory.should_upgrade("vtov.studio"));
    assert!(!factory.should_upgrade("cdn.vtov.studio"));
}

#[test]
fn malformed_entry_fails_build() {
    let err = TlsRoute::new()
        .upgrade_hosts(["amazing today"])
        .build()
        .unwrap_err();
    assert!(err.is_config());

    let err = TlsRoute::new().upgrade_hosts([""]).build().unwrap_err();
    assert!(err.is_config());
}

#[test]
fn single_target_upgrades_any_named_host() {
    let factory = TlsRoute::single_target()
        .observer(HandshakeObserver::new(|_| {}))
        .build()
        .unwrap();

    assert!(factory.should_upgrade("www.google.com"));
    assert!(!factory.should_upgrade(""));
    assert_eq!(factory.supported_cipher_suites().len(), tlsroute::CIPHER_SUITES.len());
}

#[test]
fn route_config_drives_builder() {
    let config = RouteConfig::from_json_str(
        r#"{"upgrade_hosts": ["edge.example"], "protocol": "tls13", "read_timeout_ms": 250}"#,
    )
    .unwrap();
    let factory = TlsRoute::from_config(&config).build().unwrap();

    assert!(factory.should_upgrade("edge.example"));
    assert!(!factory.should_upgrade("amazing.today"));
    assert_eq!(factory.config().read_timeout, Duration::from_millis(250));
    assert_eq!(factory.config().protocol, TlsVersion::Tls13);
}

#[test]
fn hosts_list_overrides_config_hosts() {
    let config = RouteConfig::from_json_str(r#"{"upgrade_hosts": ["edge.example"]}"#)
        .unwrap()
        .with_hosts_list("vtov.studio,amazing.today");
    let factory = TlsRoute::from_config(&config).build().unwrap();

    assert!(!factory.should_upgrade("edge.example"));
    assert!(factory.should_upgrade("vtov.studio"));
}

#[test]
fn zero_connect_timeout_is_rejected() {
    let config = RouteConfig {
        connect_timeout_ms: Some(0),
        ..RouteConfig::default()
    };
    let err = TlsRoute::from_config(&config).build().unwrap_err();
    assert!(err.is_config());
}
