use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Host and port the OS-wide proxy settings should point at.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ProxyEndpoint {
    pub(crate) host: String,
    pub(crate) port: u16,
}

impl ProxyEndpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Result<Self, String> {
        let host = host.into();
        let trimmed = host.trim();
        if trimmed.is_empty() {
            return Err("proxy host cannot be empty".to_string());
        }
        if trimmed.chars().any(|c| c.is_whitespace() || c == '\'' || c == '"') {
            return Err(format!("proxy host '{trimmed}' contains invalid characters"));
        }
        if port == 0 {
            return Err("proxy port must be between 1 and 65535".to_string());
        }
        Ok(Self {
            host: trimmed.to_string(),
            port,
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }
}

impl fmt::Display for ProxyEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') && !self.host.starts_with('[') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

impl FromStr for ProxyEndpoint {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (host, port) = s
            .trim()
            .rsplit_once(':')
            .ok_or_else(|| format!("'{s}' must be HOST:PORT"))?;
        let host = host
            .strip_prefix('[')
            .and_then(|h| h.strip_suffix(']'))
            .unwrap_or(host);
        let port = port
            .parse::<u16>()
            .map_err(|_| format!("invalid port '{port}' in '{s}'"))?;
        Self::new(host, port)
    }
}

impl TryFrom<String> for ProxyEndpoint {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ProxyEndpoint> for String {
    fn from(value: ProxyEndpoint) -> Self {
        value.to_string()
    }
}
