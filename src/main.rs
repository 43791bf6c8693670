use anyhow::{Context, Result};
use clap::Parser;
use geoprobe::config::ProbeConfig;
use geoprobe::engine::{build_sampler, CycleOutcome};
use geoprobe::observability::logging;
use geoprobe::sources::resolve_device_id;
use log::{error, info};
use std::path::PathBuf;

/// Periodically record this device's location and public address.
#[derive(Debug, Parser)]
#[command(name = "geoprobe", version, about)]
struct Cli {
    /// JSON config file; environment variables override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Run a single cycle and exit
    #[arg(long)]
    once: bool,

    /// Print the effective configuration (credentials masked) and exit
    #[arg(long)]
    print_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let layered = ProbeConfig::layered(cli.config.as_deref(), |key| std::env::var(key).ok());

    if cli.print_config {
        let config = layered.context("Invalid configuration")?;
        println!("{}", serde_json::to_string_pretty(&config.redacted())?);
        return Ok(());
    }

    // Log to the default directory when the configured one is unknown
    let log_dir = match &layered {
        Ok(config) => config.log_dir.clone(),
        Err(_) => ProbeConfig::default().log_dir,
    };
    if let Some(path) = logging::init(&log_dir)? {
        info!("Logging to {:?}", path);
    }

    let config = layered
        .context("Invalid configuration")
        .inspect_err(|e| error!("{:#}, exiting", e))?;
    config.validate().inspect_err(|e| error!("{}, exiting", e))?;

    let device_id = resolve_device_id(config.device_id.as_deref())
        .await
        .inspect_err(|e| error!("{}, exiting", e))?;
    let mut sampler = build_sampler(&config, &device_id).inspect_err(|e| error!("{}, exiting", e))?;

    if cli.once {
        return match sampler.run_cycle().await {
            CycleOutcome::Recorded(_) => Ok(()),
            CycleOutcome::Failed { record, .. } => Err(anyhow::anyhow!(
                "cycle failed during {}: {}",
                record.error_context(),
                record.error_message()
            )),
        };
    }

    sampler.run_until(shutdown_signal()).await;
    Ok(())
}

/// Resolves on Ctrl-C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if tokio::signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl-C, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}
