//! Multi-region orphan detector.

use super::classifier::is_orphan_candidate;
use super::types::{Candidate, DetectionReport};
use crate::config::FilterConfig;
use crate::error::{ConfigError, ConfigResult};
use crate::gateway::{GatewayFactory, ListFilter};
use eni_types::CleanupError;
use futures::future::join_all;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Result of scanning one region.
#[derive(Debug, Default)]
struct RegionScan {
    candidates: Vec<Candidate>,
    scanned: usize,
    ignored: usize,
}

/// Lists interfaces in every region and classifies them.
///
/// Regions are scanned concurrently, one task each. A region whose client
/// or listing fails is reported in [`DetectionReport::region_errors`] and
/// never affects the others.
pub struct Detector {
    factory: Arc<dyn GatewayFactory>,
    filter: Arc<FilterConfig>,
}

impl Detector {
    pub fn new(factory: Arc<dyn GatewayFactory>, filter: FilterConfig) -> Self {
        Self {
            factory,
            filter: Arc::new(filter),
        }
    }

    /// Scans `regions`. Candidates come back grouped by region in the order
    /// the regions were given.
    ///
    /// An empty region list is rejected; a reachable region with no
    /// interfaces is not an error.
    pub async fn detect(&self, regions: &[String], list_filter: &ListFilter) -> ConfigResult<DetectionReport> {
        if regions.is_empty() {
            return Err(ConfigError::invalid_config(
                "regions",
                "at least one region must be specified",
            ));
        }

        let handles = regions.iter().map(|region| {
            let factory = Arc::clone(&self.factory);
            let filter = Arc::clone(&self.filter);
            let list_filter = list_filter.clone();
            let region = region.clone();
            tokio::spawn(async move { scan_region(factory.as_ref(), &filter, &region, &list_filter).await })
        });
        let results = join_all(handles).await;

        let mut report = DetectionReport::default();
        for (region, joined) in regions.iter().zip(results) {
            let result = joined.unwrap_or_else(|join_err| {
                Err(CleanupError::region_unavailable(
                    region,
                    format!("scan task failed: {}", join_err),
                ))
            });

            match result {
                Ok(scan) => {
                    report.scanned += scan.scanned;
                    report.ignored += scan.ignored;
                    report.candidates.extend(scan.candidates);
                }
                Err(err) => {
                    warn!(region = %region, error = %err, "Region scan failed");
                    report.region_errors.push(err);
                }
            }
        }

        info!(
            regions = regions.len(),
            scanned = report.scanned,
            orphans = report.orphan_count(),
            filtered = report.filtered_count(),
            failed_regions = report.region_errors.len(),
            "Detection complete"
        );
        Ok(report)
    }
}

async fn scan_region(
    factory: &dyn GatewayFactory,
    filter: &FilterConfig,
    region: &str,
    list_filter: &ListFilter,
) -> Result<RegionScan, CleanupError> {
    let gateway = factory
        .gateway(region)
        .await
        .map_err(|e| CleanupError::region_unavailable(region, e.to_string()))?;

    let records = gateway
        .list_interfaces(list_filter)
        .await
        .map_err(|e| CleanupError::region_unavailable(region, e.to_string()))?;

    let mut scan = RegionScan {
        scanned: records.len(),
        ..RegionScan::default()
    };

    for record in records {
        let verdict = is_orphan_candidate(&record, filter);
        if verdict.orphan {
            info!(eni = %record.id, region = %region, reason = %verdict.reason, "Found orphaned ENI");
            scan.candidates.push(Candidate::new(record, verdict));
        } else if verdict.reason.is_user_filter() {
            debug!(eni = %record.id, region = %region, reason = %verdict.reason, "ENI filtered out");
            scan.candidates.push(Candidate::new(record, verdict));
        } else {
            debug!(eni = %record.id, region = %region, reason = %verdict.reason, "ENI ignored");
            scan.ignored += 1;
        }
    }

    Ok(scan)
}
