use models::PlatformError;
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use utilities::{run_succeeded, settle, CommandRunner, CommandSpec, PlatformKind};

use crate::Fingerprint;

pub const LINUX_CA_DIR: &str = "/usr/local/share/ca-certificates";
pub const LINUX_INSTALLED_CERT: &str = "/usr/local/share/ca-certificates/terasu-proxy.crt";
const MACOS_SYSTEM_KEYCHAIN: &str = "/Library/Keychains/System.keychain";

/// Adds and removes the CA in the operating system's trust store.
///
/// Every operation is a single attempt. Nothing is rolled back: if the Linux
/// copy succeeds and the refresh fails, the copied file stays.
pub struct TrustStoreInstaller {
    platform: PlatformKind,
    runner: Arc<dyn CommandRunner>,
}

impl TrustStoreInstaller {
    pub fn new(platform: PlatformKind, runner: Arc<dyn CommandRunner>) -> Self {
        Self { platform, runner }
    }

    pub fn platform(&self) -> PlatformKind {
        self.platform
    }

    pub fn install_command(&self, cert_path: &Path) -> Result<CommandSpec, PlatformError> {
        let cert = cert_path.to_string_lossy();
        match self.platform {
            PlatformKind::Windows => Ok(CommandSpec::new(
                "certutil",
                ["-addstore", "-f", "root", &*cert],
            )),
            PlatformKind::MacOs => Ok(CommandSpec::new(
                "security",
                [
                    "add-trusted-cert",
                    "-d",
                    "-r",
                    "trustRoot",
                    "-k",
                    MACOS_SYSTEM_KEYCHAIN,
                    &*cert,
                ],
            )),
            // The refresh tool is optional here: without it the copy alone counts.
            PlatformKind::Linux => Ok(shell(format!(
                "mkdir -p {LINUX_CA_DIR} && cp {} {LINUX_INSTALLED_CERT} && \
                 (command -v update-ca-certificates >/dev/null 2>&1 && update-ca-certificates --fresh || true)",
                shell_quote(&cert)
            ))),
            PlatformKind::Unsupported => Err(self.unsupported("CA install")),
        }
    }

    pub fn uninstall_command(
        &self,
        fingerprint: Option<&Fingerprint>,
        installed_path: Option<&Path>,
    ) -> Result<CommandSpec, PlatformError> {
        match self.platform {
            PlatformKind::Windows => {
                let fp = fingerprint.ok_or_else(|| self.missing_fingerprint())?;
                Ok(CommandSpec::new(
                    "powershell",
                    [
                        "-NoProfile".to_string(),
                        "-Command".to_string(),
                        format!("Remove-Item -Path Cert:\\LocalMachine\\Root\\{fp}"),
                    ],
                ))
            }
            PlatformKind::MacOs => {
                let fp = fingerprint.ok_or_else(|| self.missing_fingerprint())?;
                Ok(CommandSpec::new(
                    "security",
                    ["delete-certificate".to_string(), "-Z".to_string(), fp.to_string()],
                ))
            }
            // Unlike install, the refresh tool is invoked unconditionally; a
            // host without it reports failure even though the file is gone.
            PlatformKind::Linux => {
                let path = installed_path
                    .map(|p| p.to_string_lossy().into_owned())
                    .unwrap_or_else(|| LINUX_INSTALLED_CERT.to_string());
                Ok(shell(format!(
                    "rm -f {} && update-ca-certificates",
                    shell_quote(&path)
                )))
            }
            PlatformKind::Unsupported => Err(self.unsupported("CA uninstall")),
        }
    }

    pub async fn try_install(
        &self,
        cert_path: &Path,
        cancel: &CancellationToken,
    ) -> Result<bool, PlatformError> {
        let cmd = self.install_command(cert_path)?;
        run_succeeded(self.runner.as_ref(), &cmd, cancel).await
    }

    pub async fn try_uninstall(
        &self,
        fingerprint: Option<&Fingerprint>,
        installed_path: Option<&Path>,
        cancel: &CancellationToken,
    ) -> Result<bool, PlatformError> {
        let cmd = self.uninstall_command(fingerprint, installed_path)?;
        run_succeeded(self.runner.as_ref(), &cmd, cancel).await
    }

    pub async fn install(&self, cert_path: &Path, cancel: &CancellationToken) -> bool {
        settle("CA install", self.try_install(cert_path, cancel).await)
    }

    pub async fn uninstall(
        &self,
        fingerprint: Option<&Fingerprint>,
        installed_path: Option<&Path>,
        cancel: &CancellationToken,
    ) -> bool {
        settle(
            "CA uninstall",
            self.try_uninstall(fingerprint, installed_path, cancel).await,
        )
    }

    fn unsupported(&self, operation: &'static str) -> PlatformError {
        PlatformError::UnsupportedPlatform {
            platform: self.platform.to_string(),
            operation,
        }
    }

    fn missing_fingerprint(&self) -> PlatformError {
        PlatformError::MissingFingerprint {
            platform: self.platform.to_string(),
            operation: "CA uninstall",
        }
    }
}

fn shell(script: String) -> CommandSpec {
    CommandSpec::new("sh", ["-lc".to_string(), script])
}

/// Single-quote `s` for POSIX sh.
fn shell_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', r"'\''"))
}
