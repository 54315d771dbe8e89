//! eni-cleanupd - reclaims orphaned ENIs when a stack is applied or destroyed

use clap::Parser;
use eni_cleanup::{CancellationToken, GatewayFactory};
use eni_cleanupd::{init_logging, run, Args, EXIT_CONFIG};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let config = match args.load_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("eni-cleanupd: {:#}", e);
            return ExitCode::from(EXIT_CONFIG);
        }
    };

    if let Err(e) = init_logging(&config.log_level, args.log_format) {
        eprintln!("eni-cleanupd: {:#}", e);
        return ExitCode::from(EXIT_CONFIG);
    }

    info!("--- Starting eni-cleanupd ---");

    let cancel = CancellationToken::new();
    watch_shutdown(cancel.clone(), args.timeout());

    let factory = match gateway_factory() {
        Ok(factory) => factory,
        Err(e) => {
            error!(error = %e, "Cannot create EC2 gateway");
            return ExitCode::from(EXIT_CONFIG);
        }
    };

    match run(&args, config, factory, cancel).await {
        Ok(status) => ExitCode::from(status),
        Err(e) => {
            error!(error = %format!("{:#}", e), "eni-cleanupd failed");
            ExitCode::from(EXIT_CONFIG)
        }
    }
}

/// Cancels the run on Ctrl-C or once `timeout` elapses.
fn watch_shutdown(cancel: CancellationToken, timeout: Option<Duration>) {
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            warn!("Received interrupt, finishing in-flight interfaces");
            on_signal.cancel();
        }
    });

    if let Some(timeout) = timeout {
        tokio::spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => {}
                _ = tokio::time::sleep(timeout) => {
                    warn!(timeout = ?timeout, "Timeout reached, not starting further interfaces");
                    cancel.cancel();
                }
            }
        });
    }
}

#[cfg(feature = "aws")]
fn gateway_factory() -> anyhow::Result<Arc<dyn GatewayFactory>> {
    Ok(Arc::new(eni_cleanupd::aws::Ec2GatewayFactory::new()))
}

#[cfg(not(feature = "aws"))]
fn gateway_factory() -> anyhow::Result<Arc<dyn GatewayFactory>> {
    anyhow::bail!("built without AWS support")
}
