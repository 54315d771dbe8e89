//! eni-cleanupd - destroy-time ENI cleanup hook
//!
//! Wires the command line, logging and the EC2 gateway around
//! [`EniCleanupHook`] and turns its report into an exit status.

#[cfg(feature = "aws")]
pub mod aws;
pub mod cli;
pub mod logging;

use anyhow::Context;
use eni_cleanup::{CancellationToken, CleanupConfig, CleanupReport, EniCleanupHook, GatewayFactory, HookPhase};
use std::sync::Arc;
use tracing::{info, warn};

pub use cli::{Args, LogFormat};
pub use logging::init_logging;

/// Exit status for a configuration the hook refuses to run with.
pub const EXIT_CONFIG: u8 = 2;

/// Maps a finished run to the process exit status.
///
/// Destroy never blocks teardown: failures are reported and tagged but
/// the exit status stays zero. Apply fails on any failure or region error.
pub fn exit_status(phase: HookPhase, report: &CleanupReport) -> u8 {
    match phase {
        HookPhase::Destroy => 0,
        HookPhase::Apply if report.has_failures() => 1,
        HookPhase::Apply => 0,
    }
}

/// Runs one hook invocation and prints the report to stdout.
pub async fn run(
    args: &Args,
    config: CleanupConfig,
    factory: Arc<dyn GatewayFactory>,
    cancel: CancellationToken,
) -> anyhow::Result<u8> {
    let hook = EniCleanupHook::new(config, factory).context("invalid configuration")?;

    let report = hook.run(args.phase, &cancel).await;

    if args.json {
        println!("{}", report.to_json().context("serialising report")?);
    } else {
        print!("{}", report.render_text());
    }

    if report.has_failures() {
        warn!(
            failure = report.summary.failure,
            region_errors = report.region_errors.len(),
            "ENI cleanup finished with failures"
        );
    } else {
        info!(success = report.summary.success, skipped = report.summary.skipped, "ENI cleanup finished");
    }
    Ok(exit_status(args.phase, &report))
}
