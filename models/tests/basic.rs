use models::{AppConfig, PlatformError, ProxyEndpoint};
use std::io;
use std::path::PathBuf;

#[test]
fn endpoint_parses_host_and_port() {
    let ep: ProxyEndpoint = "127.0.0.1:8080".parse().unwrap();
    assert_eq!(ep.host(), "127.0.0.1");
    assert_eq!(ep.port(), 8080);
    assert_eq!(ep.to_string(), "127.0.0.1:8080");
}

#[test]
fn endpoint_accepts_bracketed_ipv6() {
    let ep: ProxyEndpoint = "[::1]:3128".parse().unwrap();
    assert_eq!(ep.host(), "::1");
    assert_eq!(ep.port(), 3128);
    assert_eq!(ep.to_string(), "[::1]:3128");
}

#[test]
fn endpoint_rejects_port_zero_and_empty_host() {
    assert!(ProxyEndpoint::new("localhost", 0).is_err());
    assert!(ProxyEndpoint::new("   ", 8080).is_err());
    assert!("localhost".parse::<ProxyEndpoint>().is_err());
    assert!("localhost:70000".parse::<ProxyEndpoint>().is_err());
    assert!(ProxyEndpoint::new("evil' host", 8080).is_err());
}

#[test]
fn endpoint_from_config_goes_through_validation() {
    assert!(toml::from_str::<AppConfig>("listen = \"127.0.0.1:0\"\n").is_err());
    assert!(toml::from_str::<AppConfig>("listen = \":8080\"\n").is_err());

    let ep = ProxyEndpoint::new("  proxy.local ", 3128).unwrap();
    assert_eq!(ep.host(), "proxy.local");
    assert_eq!(ep.port(), 3128);
}

#[test]
fn config_defaults_fill_missing_sections() {
    let cfg: AppConfig = toml::from_str("").unwrap();
    assert_eq!(cfg, AppConfig::default());
    assert_eq!(cfg.listen, ProxyEndpoint::new("127.0.0.1", 8080).unwrap());
    assert_eq!(cfg.ca.cert_path, PathBuf::from("data/ca.pem"));
    assert_eq!(cfg.ca.key_path, Some(PathBuf::from("data/ca.key")));
    assert!(cfg.platform.is_none());
}

#[test]
fn config_toml_round_trip() {
    let text = r#"
listen = "10.0.0.5:3128"
platform = "linux"

[ca]
cert_path = "/var/lib/terasu/ca.pem"
key_path = "/var/lib/terasu/ca.key"
installed_path = "/usr/local/share/ca-certificates/custom.crt"
"#;
    let cfg: AppConfig = toml::from_str(text).unwrap();
    assert_eq!(cfg.listen.port(), 3128);
    assert_eq!(cfg.platform.as_deref(), Some("linux"));
    assert_eq!(
        cfg.ca.installed_path,
        Some(PathBuf::from("/usr/local/share/ca-certificates/custom.crt"))
    );

    let back: AppConfig = toml::from_str(&toml::to_string(&cfg).unwrap()).unwrap();
    assert_eq!(back, cfg);
}

#[test]
fn interrupted_spawn_maps_to_cancelled() {
    let err = PlatformError::from_spawn("sh", io::Error::new(io::ErrorKind::Interrupted, "x"));
    assert!(matches!(err, PlatformError::Cancelled { .. }));
    let err = PlatformError::from_spawn("sh", io::Error::new(io::ErrorKind::NotFound, "x"));
    assert!(matches!(err, PlatformError::ExternalTool { .. }));
}
