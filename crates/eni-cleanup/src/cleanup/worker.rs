//! Per-candidate remediation.
//!
//! One worker drives one interface through detach, delete, the
//! security-group fallback and manual-review tagging. Every failure ends in
//! a recorded outcome; nothing here returns an error to the orchestrator.

use super::plan::{manual_review_tags, remaining_groups, target_group_mismatch};
use crate::config::CleanupOptions;
use crate::error::GatewayError;
use crate::gateway::NetworkInterfaceGateway;
use chrono::Utc;
use eni_types::{CleanupAction, CleanupError, CleanupOutcome, NetworkInterfaceRecord};
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{debug, info, warn};

pub(crate) struct CandidateWorker {
    gateway: Arc<dyn NetworkInterfaceGateway>,
    options: Arc<CleanupOptions>,
    id: String,
    region: String,
    log: Vec<String>,
}

impl CandidateWorker {
    pub(crate) fn new(
        gateway: Arc<dyn NetworkInterfaceGateway>,
        options: Arc<CleanupOptions>,
        snapshot: &NetworkInterfaceRecord,
    ) -> Self {
        Self {
            gateway,
            options,
            id: snapshot.id.clone(),
            region: snapshot.region.clone(),
            log: Vec::new(),
        }
    }

    /// Runs the state machine to a terminal outcome.
    pub(crate) async fn run(mut self, snapshot: NetworkInterfaceRecord) -> CleanupOutcome {
        if let Some(reason) = target_group_mismatch(&snapshot, &self.options) {
            return self.skip(reason);
        }

        // The snapshot may be stale by now; act on what the provider says.
        let record = match self.gateway.describe_interface(&self.id).await {
            Ok(Some(record)) => record,
            Ok(None) => return self.skip("no longer exists"),
            Err(e) => {
                let err = CleanupError::lookup_failed(&self.id, e.to_string());
                return self.fail(CleanupAction::Error, err);
            }
        };

        // Re-attached since detection
        if !record.status.is_available() {
            return self.skip(format!("no longer available (status {})", record.status));
        }

        if let Some(reason) = target_group_mismatch(&record, &self.options) {
            return self.skip(reason);
        }

        if let Some(attachment) = record.attachment.as_ref().filter(|a| a.needs_detach()) {
            let attachment_id = attachment.attachment_id.clone();
            if let Err(e) = self.detach(&attachment_id).await {
                let err = CleanupError::detach_failed(&self.id, attachment_id, e.to_string());
                return self.fail(CleanupAction::Error, err);
            }
        }

        let groups = remaining_groups(&record, &self.options);
        if self.options.disassociate_only {
            return self.disassociate(&groups).await;
        }
        self.delete_with_fallback(&groups).await
    }

    async fn disassociate(mut self, groups: &[String]) -> CleanupOutcome {
        match self.gateway.modify_security_groups(&self.id, groups).await {
            Ok(()) => {
                info!(eni = %self.id, region = %self.region, "Disassociated ENI from security groups");
                self.note(format!("Disassociated ENI {} {}", self.id, describe_groups(groups)));
                self.finish(CleanupAction::Disassociated)
            }
            Err(e) if e.is_not_found() => self.skip("no longer exists"),
            Err(e) => {
                let err = CleanupError::modify_groups_failed(&self.id, e.to_string());
                self.fail_for_review(CleanupAction::TaggedForManualReview, err)
                    .await
            }
        }
    }

    async fn delete_with_fallback(mut self, groups: &[String]) -> CleanupOutcome {
        let first = match self.delete().await {
            Ok(()) => return self.finish(CleanupAction::Deleted),
            Err(e) => CleanupError::delete_failed(&self.id, e.to_string()),
        };
        warn!(eni = %self.id, region = %self.region, error = %first, "Delete failed, removing security groups");
        self.note(first.to_string());

        match self.gateway.modify_security_groups(&self.id, groups).await {
            Ok(()) => {}
            Err(e) if e.is_not_found() => return self.skip("no longer exists"),
            Err(e) => {
                let err = CleanupError::modify_groups_failed(&self.id, e.to_string());
                return self
                    .fail_for_review(CleanupAction::TaggedForManualReview, err)
                    .await;
            }
        }
        self.note(format!("Disassociated ENI {} {}", self.id, describe_groups(groups)));

        let delay = self.options.retry_delay();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        match self.delete().await {
            Ok(()) => self.finish(CleanupAction::Deleted),
            Err(e) => {
                let err = CleanupError::delete_failed_after_fallback(&self.id, e.to_string());
                self.fail_for_review(CleanupAction::DisassociatedDeleteFailed, err)
                    .await
            }
        }
    }

    /// Deletes the interface. An interface that is already gone counts as
    /// deleted.
    async fn delete(&mut self) -> Result<(), GatewayError> {
        match self.gateway.delete_interface(&self.id).await {
            Ok(()) => {
                info!(eni = %self.id, region = %self.region, "Deleted ENI");
                self.note(format!("Deleted ENI {}", self.id));
                Ok(())
            }
            Err(e) if e.is_not_found() => {
                info!(eni = %self.id, region = %self.region, "ENI already deleted");
                self.note(format!("ENI {} already deleted", self.id));
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    async fn detach(&mut self, attachment_id: &str) -> Result<(), GatewayError> {
        debug!(eni = %self.id, attachment = %attachment_id, "Detaching ENI");
        match self.gateway.detach(attachment_id, true).await {
            Ok(()) => {}
            Err(e) if e.is_not_found() => {
                debug!(eni = %self.id, attachment = %attachment_id, "Attachment already gone");
                return Ok(());
            }
            Err(e) => return Err(e),
        }
        self.note(format!(
            "Detached ENI {} (attachment {})",
            self.id, attachment_id
        ));
        self.wait_for_detach().await;
        Ok(())
    }

    /// Polls until the attachment is gone or the wait runs out. Running out
    /// is not an error: a delete that still hits the attachment goes through
    /// the normal fallback.
    async fn wait_for_detach(&mut self) {
        let wait = self.options.detach_wait();
        if wait.is_zero() {
            return;
        }
        let interval = self.options.detach_poll_interval();
        let deadline = Instant::now() + wait;

        loop {
            let now = Instant::now();
            if now >= deadline {
                warn!(eni = %self.id, region = %self.region, ?wait, "ENI still attached, proceeding");
                self.note(format!("ENI {} still attached after {:?}", self.id, wait));
                return;
            }
            tokio::time::sleep(interval.min(deadline - now)).await;

            match self.gateway.describe_interface(&self.id).await {
                Ok(Some(record)) if record.needs_detach() => {}
                Ok(_) => return,
                Err(e) => debug!(eni = %self.id, error = %e, "Attachment poll failed"),
            }
        }
    }

    /// Writes the manual-review tags. Returns whether they were written.
    async fn tag_for_manual_review(&mut self, cause: &CleanupError) -> bool {
        let tags = manual_review_tags(&cause.excerpt(), Utc::now());
        match self.gateway.create_tags(&self.id, &tags).await {
            Ok(()) => {
                info!(eni = %self.id, region = %self.region, "Tagged ENI for manual cleanup");
                self.note(format!("Tagged ENI {} for manual cleanup", self.id));
                true
            }
            Err(e) => {
                let err = CleanupError::tag_failed(&self.id, e.to_string());
                warn!(eni = %self.id, region = %self.region, error = %err, "Manual-review tagging failed");
                self.note(err.to_string());
                false
            }
        }
    }

    async fn fail_for_review(mut self, action: CleanupAction, err: CleanupError) -> CleanupOutcome {
        warn!(eni = %self.id, region = %self.region, error = %err, "ENI needs manual cleanup");
        self.note(err.to_string());
        let tagged = self.tag_for_manual_review(&err).await;
        let mut outcome = self.finish(action).with_error(err);
        outcome.manual_review_tagged = tagged;
        outcome
    }

    fn fail(mut self, action: CleanupAction, err: CleanupError) -> CleanupOutcome {
        warn!(eni = %self.id, region = %self.region, error = %err, "ENI cleanup failed");
        self.note(err.to_string());
        self.finish(action).with_error(err)
    }

    fn skip(mut self, reason: impl Into<String>) -> CleanupOutcome {
        let reason = reason.into();
        debug!(eni = %self.id, region = %self.region, reason = %reason, "Skipping ENI");
        self.note(format!("Skipped ENI {}: {}", self.id, reason));
        CleanupOutcome::skipped(self.id, self.region, reason).with_log(self.log)
    }

    fn finish(self, action: CleanupAction) -> CleanupOutcome {
        CleanupOutcome::new(self.id, self.region, action).with_log(self.log)
    }

    fn note(&mut self, line: String) {
        self.log.push(line);
    }
}

fn describe_groups(groups: &[String]) -> String {
    if groups.is_empty() {
        "from all security groups".to_string()
    } else {
        format!("(security groups now [{}])", groups.join(", "))
    }
}
