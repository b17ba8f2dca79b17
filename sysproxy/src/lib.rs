use models::{PlatformError, ProxyEndpoint};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use utilities::{run_succeeded, settle, CommandRunner, CommandSpec, PlatformKind};

/// macOS network services whose web proxies get toggled. Fixed: interfaces
/// that are actually present are not enumerated.
pub const MACOS_NETWORK_SERVICES: [&str; 2] = ["Wi-Fi", "Ethernet"];

const GNOME_PROXY: &str = "org.gnome.system.proxy";
const GNOME_PROXY_HTTP: &str = "org.gnome.system.proxy.http";
const GNOME_PROXY_HTTPS: &str = "org.gnome.system.proxy.https";

/// Points the OS-wide HTTP(S) proxy at the interception proxy and back.
pub struct SystemProxyConfigurator {
    platform: PlatformKind,
    runner: Arc<dyn CommandRunner>,
}

impl SystemProxyConfigurator {
    pub fn new(platform: PlatformKind, runner: Arc<dyn CommandRunner>) -> Self {
        Self { platform, runner }
    }

    pub fn platform(&self) -> PlatformKind {
        self.platform
    }

    pub fn enable_commands(
        &self,
        endpoint: &ProxyEndpoint,
    ) -> Result<Vec<CommandSpec>, PlatformError> {
        let host = endpoint.host();
        let port = endpoint.port().to_string();
        let port = port.as_str();
        match self.platform {
            PlatformKind::Windows => {
                let target = endpoint.to_string();
                Ok(vec![CommandSpec::new(
                    "netsh",
                    ["winhttp", "set", "proxy", target.as_str()],
                )])
            }
            PlatformKind::MacOs => Ok(MACOS_NETWORK_SERVICES
                .iter()
                .flat_map(|service| {
                    [
                        CommandSpec::new("networksetup", ["-setwebproxy", *service, host, port]),
                        CommandSpec::new(
                            "networksetup",
                            ["-setsecurewebproxy", *service, host, port],
                        ),
                    ]
                })
                .collect()),
            PlatformKind::Linux => {
                let quoted_host = format!("'{host}'");
                Ok(vec![
                    gsettings(GNOME_PROXY, "mode", "'manual'"),
                    gsettings(GNOME_PROXY_HTTP, "host", &quoted_host),
                    gsettings(GNOME_PROXY_HTTP, "port", port),
                    gsettings(GNOME_PROXY_HTTPS, "host", &quoted_host),
                    gsettings(GNOME_PROXY_HTTPS, "port", port),
                ])
            }
            PlatformKind::Unsupported => Err(self.unsupported("system proxy enable")),
        }
    }

    pub fn disable_commands(&self) -> Result<Vec<CommandSpec>, PlatformError> {
        match self.platform {
            PlatformKind::Windows => Ok(vec![CommandSpec::new(
                "netsh",
                ["winhttp", "reset", "proxy"],
            )]),
            PlatformKind::MacOs => Ok(MACOS_NETWORK_SERVICES
                .iter()
                .flat_map(|service| {
                    [
                        CommandSpec::new("networksetup", ["-setwebproxystate", *service, "off"]),
                        CommandSpec::new(
                            "networksetup",
                            ["-setsecurewebproxystate", *service, "off"],
                        ),
                    ]
                })
                .collect()),
            PlatformKind::Linux => Ok(vec![gsettings(GNOME_PROXY, "mode", "'none'")]),
            PlatformKind::Unsupported => Err(self.unsupported("system proxy disable")),
        }
    }

    /// `Ok(true)` only if every command exited 0. All commands run even after
    /// one fails; a spawn failure or cancellation stops the sequence.
    pub async fn try_enable(
        &self,
        endpoint: &ProxyEndpoint,
        cancel: &CancellationToken,
    ) -> Result<bool, PlatformError> {
        let cmds = self.enable_commands(endpoint)?;
        self.run_all(&cmds, cancel).await
    }

    pub async fn try_disable(&self, cancel: &CancellationToken) -> Result<bool, PlatformError> {
        let cmds = self.disable_commands()?;
        self.run_all(&cmds, cancel).await
    }

    pub async fn enable(&self, endpoint: &ProxyEndpoint, cancel: &CancellationToken) -> bool {
        settle("system proxy enable", self.try_enable(endpoint, cancel).await)
    }

    pub async fn disable(&self, cancel: &CancellationToken) -> bool {
        settle("system proxy disable", self.try_disable(cancel).await)
    }

    async fn run_all(
        &self,
        cmds: &[CommandSpec],
        cancel: &CancellationToken,
    ) -> Result<bool, PlatformError> {
        let mut all_ok = true;
        for cmd in cmds {
            let ok = run_succeeded(self.runner.as_ref(), cmd, cancel).await?;
            debug!(command = %cmd, ok, "proxy setting applied");
            all_ok &= ok;
        }
        Ok(all_ok)
    }

    fn unsupported(&self, operation: &'static str) -> PlatformError {
        PlatformError::UnsupportedPlatform {
            platform: self.platform.to_string(),
            operation,
        }
    }
}

fn gsettings(schema: &str, key: &str, value: &str) -> CommandSpec {
    CommandSpec::new("gsettings", ["set", schema, key, value])
}
