use ca::{ensure_ca_files, fingerprint_for_pem_file, EnsureOutcome, Fingerprint, TrustStoreInstaller};
use models::{AppConfig, PlatformError, ProxyEndpoint};
use std::path::Path;
use std::sync::Arc;
use sysproxy::SystemProxyConfigurator;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use utilities::{CommandRunner, PlatformKind};

/// Ties the CA files, the trust store and the system proxy to one config
/// and one platform.
pub struct Controller {
    config: AppConfig,
    platform: PlatformKind,
    trust_store: TrustStoreInstaller,
    proxy: SystemProxyConfigurator,
}

impl Controller {
    pub fn new(config: AppConfig, platform: PlatformKind, runner: Arc<dyn CommandRunner>) -> Self {
        info!(%platform, "controller ready");
        Self {
            trust_store: TrustStoreInstaller::new(platform, runner.clone()),
            proxy: SystemProxyConfigurator::new(platform, runner),
            config,
            platform,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn platform(&self) -> PlatformKind {
        self.platform
    }

    pub fn ensure_ca(&self) -> Result<EnsureOutcome, PlatformError> {
        ensure_ca_files(&self.config.ca.cert_path, self.config.ca.key_path.as_deref())
    }

    pub fn ca_fingerprint(&self) -> Result<Fingerprint, PlatformError> {
        fingerprint_for_pem_file(&self.config.ca.cert_path)
    }

    /// Provision the CA if needed, then trust it. Provisioning errors
    /// propagate; an install that does not go through is `Ok(false)`.
    pub async fn install_ca(&self, cancel: &CancellationToken) -> Result<bool, PlatformError> {
        self.ensure_ca()?;
        Ok(self.trust_store.install(&self.config.ca.cert_path, cancel).await)
    }

    pub async fn uninstall_ca(
        &self,
        fingerprint: Option<Fingerprint>,
        installed_path: Option<&Path>,
        cancel: &CancellationToken,
    ) -> bool {
        let fingerprint = fingerprint.or_else(|| self.fingerprint_for_removal());
        let installed_path = installed_path.or(self.config.ca.installed_path.as_deref());
        self.trust_store
            .uninstall(fingerprint.as_ref(), installed_path, cancel)
            .await
    }

    pub async fn enable_proxy(&self, endpoint: &ProxyEndpoint, cancel: &CancellationToken) -> bool {
        self.proxy.enable(endpoint, cancel).await
    }

    pub async fn disable_proxy(&self, cancel: &CancellationToken) -> bool {
        self.proxy.disable(cancel).await
    }

    // Linux removes by path; only the keychain and Cert: store need a thumbprint.
    fn fingerprint_for_removal(&self) -> Option<Fingerprint> {
        if !matches!(self.platform, PlatformKind::Windows | PlatformKind::MacOs) {
            return None;
        }
        match self.ca_fingerprint() {
            Ok(fp) => Some(fp),
            Err(e) => {
                warn!(error = %e, "could not fingerprint configured CA");
                None
            }
        }
    }
}
