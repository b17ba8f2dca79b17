use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use models::{AppConfig, ProxyEndpoint};
use std::fs;
use std::path::{Path, PathBuf};
use utilities::PlatformKind;

pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[derive(Debug, Parser)]
#[command(name = "terasu-ctl", about = "terasu controller: CA provisioning and system proxy")]
pub struct Cli {
    /// Path to the TOML config file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Override platform detection (windows, macos, linux, unsupported)
    #[arg(long, global = true)]
    pub platform: Option<PlatformKind>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Write a config template
    Init(InitArgs),
    /// Create the CA certificate (and key) if absent
    EnsureCa,
    /// Print the CA certificate path and fingerprint
    ShowCa,
    /// Add the CA to the OS trust store
    InstallCa,
    /// Remove the CA from the OS trust store
    UninstallCa(UninstallArgs),
    /// Point the system HTTP(S) proxy at the interception proxy, or back
    Proxy(ProxyArgs),
}

#[derive(Debug, Args)]
pub struct InitArgs {
    /// Overwrite an existing config
    #[arg(long)]
    pub force: bool,
}

#[derive(Debug, Args)]
pub struct UninstallArgs {
    /// Certificate fingerprint; computed from the configured CA when omitted
    #[arg(long)]
    pub fingerprint: Option<String>,

    /// Linux: path the certificate was copied to
    #[arg(long)]
    pub installed_path: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct ProxyArgs {
    #[command(subcommand)]
    pub command: ProxyCommand,
}

#[derive(Debug, Subcommand)]
pub enum ProxyCommand {
    Enable(ProxyEnableArgs),
    Disable,
}

#[derive(Debug, Args)]
pub struct ProxyEnableArgs {
    /// Defaults to the configured listen host
    #[arg(long)]
    pub host: Option<String>,

    /// Defaults to the configured listen port
    #[arg(long)]
    pub port: Option<u16>,
}

impl Cli {
    pub fn config_path(&self) -> PathBuf {
        self.config
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
    }
}

impl ProxyEnableArgs {
    pub fn endpoint(&self, cfg: &AppConfig) -> Result<ProxyEndpoint> {
        let host = self.host.as_deref().unwrap_or(cfg.listen.host());
        let port = self.port.unwrap_or(cfg.listen.port());
        ProxyEndpoint::new(host, port).map_err(anyhow::Error::msg)
    }
}

/// Read the config at `path`; a missing file yields the defaults.
pub fn load_config(path: &Path) -> Result<AppConfig> {
    if !path.exists() {
        return Ok(AppConfig::default());
    }
    let text =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    toml::from_str(&text).with_context(|| format!("failed to parse {}", path.display()))
}

pub fn init_config_template(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!("{} already exists (pass --force to overwrite)", path.display());
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let body = toml::to_string_pretty(&AppConfig::default())?;
    fs::write(path, body).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

/// Command line beats config file beats detection.
pub fn resolve_platform(cli: Option<PlatformKind>, cfg: &AppConfig) -> Result<PlatformKind> {
    if let Some(kind) = cli {
        return Ok(kind);
    }
    match cfg.platform.as_deref() {
        Some(raw) => raw.parse().map_err(anyhow::Error::msg),
        None => Ok(PlatformKind::current()),
    }
}
