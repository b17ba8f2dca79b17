use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::ProxyEndpoint;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppConfig {
    /// Where the interception proxy listens; the system proxy is pointed here.
    #[serde(default = "default_listen")]
    pub listen: ProxyEndpoint,
    #[serde(default = "default_log_path")]
    pub log_path: PathBuf,
    /// Overrides platform detection (`windows`, `macos`, `linux`, `unsupported`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    #[serde(default)]
    pub ca: CaConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CaConfig {
    #[serde(default = "default_cert_path")]
    pub cert_path: PathBuf,
    /// The private key is only written when this is set.
    #[serde(default = "default_key_path")]
    pub key_path: Option<PathBuf>,
    /// Linux only: where the certificate was copied on install.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub installed_path: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            log_path: default_log_path(),
            platform: None,
            ca: CaConfig::default(),
        }
    }
}

impl Default for CaConfig {
    fn default() -> Self {
        Self {
            cert_path: default_cert_path(),
            key_path: default_key_path(),
            installed_path: None,
        }
    }
}

fn default_listen() -> ProxyEndpoint {
    ProxyEndpoint {
        host: "127.0.0.1".to_string(),
        port: 8080,
    }
}

fn default_log_path() -> PathBuf {
    PathBuf::from("terasu-controller.log")
}

fn default_cert_path() -> PathBuf {
    PathBuf::from("data/ca.pem")
}

fn default_key_path() -> Option<PathBuf> {
    Some(PathBuf::from("data/ca.key"))
}
