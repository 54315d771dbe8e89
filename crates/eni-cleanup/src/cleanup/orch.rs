//! Cleanup orchestrator.

use super::plan::dry_run_outcome;
use super::worker::CandidateWorker;
use crate::aggregator::ResultAggregator;
use crate::config::CleanupOptions;
use crate::detect::Candidate;
use crate::gateway::GatewayFactory;
use eni_types::{CleanupError, CleanupOutcome, CleanupSummary, NetworkInterfaceRecord};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Candidates of one region, each with its input index.
type RegionBatch = Vec<(usize, NetworkInterfaceRecord)>;

/// Drives every candidate to a terminal outcome.
///
/// Regions run in parallel with no bound. Inside a region at most
/// `concurrency_limit` candidates are in flight. Cancellation stops new
/// candidates from starting; candidates already running finish.
pub struct CleanupOrch {
    factory: Arc<dyn GatewayFactory>,
    options: Arc<CleanupOptions>,
}

impl CleanupOrch {
    pub fn new(factory: Arc<dyn GatewayFactory>, options: CleanupOptions) -> Self {
        Self {
            factory,
            options: Arc::new(options),
        }
    }

    /// Processes `candidates` and returns exactly one outcome per candidate,
    /// in input order.
    pub async fn cleanup(&self, candidates: Vec<Candidate>, cancel: &CancellationToken) -> CleanupSummary {
        let mut aggregator = ResultAggregator::new(
            candidates
                .iter()
                .map(|c| (c.id().to_string(), c.region().to_string())),
        );

        let mut batches: Vec<(String, RegionBatch)> = Vec::new();
        for (index, candidate) in candidates.into_iter().enumerate() {
            if !candidate.is_actionable() {
                let reason = candidate.verdict.reason.to_string();
                let line = format!("Skipped ENI {}: {}", candidate.id(), reason);
                let outcome = CleanupOutcome::skipped(candidate.id(), candidate.region(), reason)
                    .with_log(vec![line]);
                aggregator.fill(index, outcome);
                continue;
            }

            if self.options.dry_run {
                aggregator.fill(index, dry_run_outcome(&candidate.record, &self.options));
                continue;
            }

            let region = candidate.record.region.clone();
            match batches.iter_mut().find(|(r, _)| *r == region) {
                Some((_, batch)) => batch.push((index, candidate.record)),
                None => batches.push((region, vec![(index, candidate.record)])),
            }
        }

        let handles: Vec<(String, Vec<(usize, String)>, JoinHandle<Vec<(usize, CleanupOutcome)>>)> =
            batches
                .into_iter()
                .map(|(region, batch)| {
                    let members = batch.iter().map(|(i, r)| (*i, r.id.clone())).collect();
                    let factory = Arc::clone(&self.factory);
                    let options = Arc::clone(&self.options);
                    let cancel = cancel.clone();
                    let task_region = region.clone();
                    let handle = tokio::spawn(async move {
                        run_region(factory, options, task_region, batch, cancel).await
                    });
                    (region, members, handle)
                })
                .collect();

        for (region, members, handle) in handles {
            match handle.await {
                Ok(outcomes) => {
                    for (index, outcome) in outcomes {
                        aggregator.fill(index, outcome);
                    }
                }
                Err(join_err) => {
                    warn!(region = %region, error = %join_err, "Region cleanup task failed");
                    for (index, id) in members {
                        let err = CleanupError::worker_panicked(&id, join_err.to_string());
                        aggregator.fill(index, CleanupOutcome::failed(id, &region, err));
                    }
                }
            }
        }

        let summary = aggregator.finish();
        info!(
            success = summary.success,
            failure = summary.failure,
            skipped = summary.skipped,
            dry_run = self.options.dry_run,
            "Cleanup complete"
        );
        summary
    }
}

async fn run_region(
    factory: Arc<dyn GatewayFactory>,
    options: Arc<CleanupOptions>,
    region: String,
    batch: RegionBatch,
    cancel: CancellationToken,
) -> Vec<(usize, CleanupOutcome)> {
    let gateway = match factory.gateway(&region).await {
        Ok(gateway) => gateway,
        Err(e) => {
            warn!(region = %region, error = %e, "No gateway for region, failing its candidates");
            let message = e.to_string();
            return batch
                .into_iter()
                .map(|(index, record)| {
                    let err = CleanupError::region_unavailable(&region, message.clone());
                    (index, CleanupOutcome::failed(record.id, &region, err))
                })
                .collect();
        }
    };

    info!(region = %region, candidates = batch.len(), limit = options.concurrency_limit, "Cleaning up region");
    let semaphore = Arc::new(Semaphore::new(options.concurrency_limit.max(1)));

    let handles: Vec<_> = batch
        .into_iter()
        .map(|(index, record)| {
            let id = record.id.clone();
            let gateway = Arc::clone(&gateway);
            let options = Arc::clone(&options);
            let semaphore = Arc::clone(&semaphore);
            let cancel = cancel.clone();
            let handle = tokio::spawn(async move {
                let permit = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => None,
                    permit = semaphore.acquire_owned() => permit.ok(),
                };
                let Some(_permit) = permit else {
                    return cancelled_outcome(&record);
                };
                if cancel.is_cancelled() {
                    return cancelled_outcome(&record);
                }
                CandidateWorker::new(gateway, options, &record).run(record).await
            });
            (index, id, handle)
        })
        .collect();

    let mut outcomes = Vec::with_capacity(handles.len());
    for (index, id, handle) in handles {
        let outcome = handle.await.unwrap_or_else(|join_err| {
            warn!(eni = %id, region = %region, error = %join_err, "Cleanup worker failed");
            let err = CleanupError::worker_panicked(&id, join_err.to_string());
            CleanupOutcome::failed(id, &region, err)
        });
        outcomes.push((index, outcome));
    }
    outcomes
}

fn cancelled_outcome(record: &NetworkInterfaceRecord) -> CleanupOutcome {
    let line = format!("Skipped ENI {}: run cancelled", record.id);
    CleanupOutcome::skipped(&record.id, &record.region, "run cancelled")
        .with_error(CleanupError::cancelled(&record.id))
        .with_log(vec![line])
}
