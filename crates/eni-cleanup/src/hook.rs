//! Destroy-time hook facade.
//!
//! Wires the detector and the orchestrator together for one calling
//! environment. The call completes (success or not) before returning, so a
//! caller can await it before deleting the parent resource.

use crate::cleanup::CleanupOrch;
use crate::config::{CleanupConfig, CleanupOptions};
use crate::detect::{DetectionReport, Detector};
use crate::error::{ConfigError, ConfigResult};
use crate::gateway::{GatewayFactory, ListFilter};
use crate::report::CleanupReport;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Lifecycle point the hook runs at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HookPhase {
    /// Create/update: honours the configured options, dry run included.
    #[default]
    Apply,
    /// Resource teardown: always acts for real.
    Destroy,
}

impl fmt::Display for HookPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HookPhase::Apply => write!(f, "apply"),
            HookPhase::Destroy => write!(f, "destroy"),
        }
    }
}

impl FromStr for HookPhase {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "apply" => Ok(HookPhase::Apply),
            "destroy" => Ok(HookPhase::Destroy),
            _ => Err(ConfigError::invalid_config(
                "phase",
                format!("'{}' is not one of apply, destroy", s),
            )),
        }
    }
}

pub struct EniCleanupHook {
    config: CleanupConfig,
    factory: Arc<dyn GatewayFactory>,
}

impl EniCleanupHook {
    /// Validates `config`. This is the only place a hard error comes from.
    pub fn new(config: CleanupConfig, factory: Arc<dyn GatewayFactory>) -> ConfigResult<Self> {
        config.validate()?;
        Ok(Self { config, factory })
    }

    pub fn config(&self) -> &CleanupConfig {
        &self.config
    }

    /// Effective cleanup options for `phase`.
    pub fn options_for(&self, phase: HookPhase) -> CleanupOptions {
        let mut options = self.config.cleanup.clone();
        if phase == HookPhase::Destroy && options.dry_run {
            info!("Dry run ignored at destroy time");
            options.dry_run = false;
        }
        options
    }

    /// Detects and cleans up orphans in every configured region.
    pub async fn run(&self, phase: HookPhase, cancel: &CancellationToken) -> CleanupReport {
        let started_at = Utc::now();
        let regions = self.config.unique_regions();
        let options = self.options_for(phase);

        info!(
            phase = %phase,
            regions = ?regions,
            dry_run = options.dry_run,
            disassociate_only = options.disassociate_only,
            "Starting ENI cleanup"
        );

        let list_filter = options
            .target_security_group()
            .map(ListFilter::by_security_group)
            .unwrap_or_default();

        let detector = Detector::new(Arc::clone(&self.factory), self.config.filter.clone());
        // Regions were validated in `new`
        let detection = detector
            .detect(&regions, &list_filter)
            .await
            .unwrap_or_else(|e| {
                warn!(error = %e, "Detection rejected its input");
                DetectionReport::default()
            });

        let dry_run = options.dry_run;
        let orch = CleanupOrch::new(Arc::clone(&self.factory), options);
        let summary = orch.cleanup(detection.candidates, cancel).await;

        CleanupReport {
            phase,
            dry_run,
            regions,
            scanned: detection.scanned,
            ignored: detection.ignored,
            summary,
            region_errors: detection.region_errors,
            started_at,
            finished_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GatewayResult;
    use crate::gateway::NetworkInterfaceGateway;
    use async_trait::async_trait;

    struct NoRegions;

    #[async_trait]
    impl GatewayFactory for NoRegions {
        async fn gateway(&self, region: &str) -> GatewayResult<Arc<dyn NetworkInterfaceGateway>> {
            Err(crate::error::GatewayError::client(region, "no credentials"))
        }
    }

    #[test]
    fn test_phase_parse() {
        assert_eq!("apply".parse::<HookPhase>().unwrap(), HookPhase::Apply);
        assert_eq!("Destroy".parse::<HookPhase>().unwrap(), HookPhase::Destroy);
        assert!("create".parse::<HookPhase>().is_err());
        assert_eq!(HookPhase::Destroy.to_string(), "destroy");
    }

    #[test]
    fn test_zero_regions_rejected() {
        let result = EniCleanupHook::new(CleanupConfig::default(), Arc::new(NoRegions));
        assert!(matches!(result, Err(ConfigError::InvalidConfig { .. })));
    }

    #[test]
    fn test_destroy_forces_live_run() {
        let mut config = CleanupConfig::for_regions(["us-east-1"]);
        config.cleanup.dry_run = true;
        let hook = EniCleanupHook::new(config, Arc::new(NoRegions)).unwrap();
        assert!(hook.options_for(HookPhase::Apply).dry_run);
        assert!(!hook.options_for(HookPhase::Destroy).dry_run);
    }

    #[tokio::test]
    async fn test_unreachable_regions_reported() {
        let config = CleanupConfig::for_regions(["us-east-1", "eu-west-1"]);
        let hook = EniCleanupHook::new(config, Arc::new(NoRegions)).unwrap();
        let report = hook.run(HookPhase::Destroy, &CancellationToken::new()).await;

        assert_eq!(report.region_errors.len(), 2);
        assert_eq!(report.summary.total(), 0);
        assert!(!report.dry_run);
    }
}
