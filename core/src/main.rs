use anyhow::Context;
use ca::{EnsureOutcome, Fingerprint};
use clap::Parser;
use controller::config::{
    init_config_template, load_config, resolve_platform, Cli, Command, ProxyCommand,
};
use controller::Controller;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;
use utilities::{init_logging, RealCommandRunner};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config_path = cli.config_path();

    if let Command::Init(args) = &cli.command {
        init_config_template(&config_path, args.force)?;
        println!("Wrote {}", config_path.display());
        return Ok(());
    }

    let cfg = load_config(&config_path)?;
    init_logging(&cfg.log_path)?;
    let platform = resolve_platform(cli.platform, &cfg)?;
    let controller = Controller::new(cfg, platform, Arc::new(RealCommandRunner::new()));

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("interrupt received, cancelling");
                cancel.cancel();
            }
        });
    }

    match &cli.command {
        Command::Init(_) => Ok(()),
        Command::EnsureCa => {
            let cert = &controller.config().ca.cert_path;
            match controller.ensure_ca().context("failed to provision CA")? {
                EnsureOutcome::Generated => println!("Generated {}", cert.display()),
                EnsureOutcome::AlreadyPresent => println!("{} already present", cert.display()),
            }
            Ok(())
        }
        Command::ShowCa => {
            controller.ensure_ca().context("failed to provision CA")?;
            let fp = controller.ca_fingerprint()?;
            println!("cert: {}", controller.config().ca.cert_path.display());
            println!("fingerprint: {fp}");
            Ok(())
        }
        Command::InstallCa => {
            let ok = controller
                .install_ca(&cancel)
                .await
                .context("failed to provision CA")?;
            println!("{}", if ok { "ca installed" } else { "ca install failed" });
            Ok(())
        }
        Command::UninstallCa(args) => {
            let fingerprint = args
                .fingerprint
                .as_deref()
                .map(Fingerprint::parse)
                .transpose()?;
            let ok = controller
                .uninstall_ca(fingerprint, args.installed_path.as_deref(), &cancel)
                .await;
            println!("{}", if ok { "ca uninstalled" } else { "ca uninstall failed" });
            Ok(())
        }
        Command::Proxy(proxy) => match &proxy.command {
            ProxyCommand::Enable(args) => {
                let endpoint = args.endpoint(controller.config())?;
                let ok = controller.enable_proxy(&endpoint, &cancel).await;
                println!(
                    "{}",
                    if ok { "system proxy enabled" } else { "system proxy enable failed" }
                );
                Ok(())
            }
            ProxyCommand::Disable => {
                let ok = controller.disable_proxy(&cancel).await;
                println!(
                    "{}",
                    if ok { "system proxy disabled" } else { "system proxy disable failed" }
                );
                Ok(())
            }
        },
    }
}
