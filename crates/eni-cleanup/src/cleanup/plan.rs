//! Pure decisions shared by live and dry runs.

use crate::config::CleanupOptions;
use crate::gateway::{ATTEMPTED_CLEANUP_TIME_TAG, DELETION_ERROR_TAG, MANUAL_CLEANUP_TAG};
use chrono::{DateTime, SecondsFormat, Utc};
use eni_types::{CleanupOutcome, NetworkInterfaceRecord, PlannedAction};

/// Reason recorded when an interface does not carry the target group.
pub(crate) fn target_group_mismatch(
    record: &NetworkInterfaceRecord,
    options: &CleanupOptions,
) -> Option<String> {
    let target = options.target_security_group()?;
    if record.has_security_group(target) {
        None
    } else {
        Some(format!("does not have target security group {}", target))
    }
}

/// Security groups the interface should be left with.
///
/// With a target group only that group is removed, otherwise all of them.
/// An empty result is replaced by the default group when one is set.
pub fn remaining_groups(record: &NetworkInterfaceRecord, options: &CleanupOptions) -> Vec<String> {
    let mut groups: Vec<String> = match options.target_security_group() {
        Some(target) => record
            .security_group_ids
            .iter()
            .filter(|g| g.as_str() != target)
            .cloned()
            .collect(),
        None => Vec::new(),
    };

    if groups.is_empty() {
        if let Some(default) = options.default_security_group() {
            groups.push(default.to_string());
        }
    }
    groups
}

/// What a live run would do to `record`.
pub fn plan_for(record: &NetworkInterfaceRecord, options: &CleanupOptions) -> PlannedAction {
    let detach = record
        .attachment
        .as_ref()
        .filter(|a| a.needs_detach())
        .map(|a| a.attachment_id.clone());

    if options.disassociate_only {
        PlannedAction::Disassociate {
            detach,
            groups: remaining_groups(record, options),
        }
    } else {
        PlannedAction::Delete { detach }
    }
}

/// Outcome for a dry run. Never touches the provider.
pub(crate) fn dry_run_outcome(record: &NetworkInterfaceRecord, options: &CleanupOptions) -> CleanupOutcome {
    if let Some(reason) = target_group_mismatch(record, options) {
        let line = format!("[DRY RUN] ENI {} ({}): skipped, {}", record.id, record.region, reason);
        return CleanupOutcome::skipped(&record.id, &record.region, reason).with_log(vec![line]);
    }

    let plan = plan_for(record, options);
    let line = format!("[DRY RUN] ENI {} ({}): would {}", record.id, record.region, plan);
    CleanupOutcome::skipped(&record.id, &record.region, "dry run")
        .with_plan(plan)
        .with_log(vec![line])
}

/// Tags written on an interface left for a human.
pub fn manual_review_tags(error_excerpt: &str, now: DateTime<Utc>) -> Vec<(String, String)> {
    let mut tags = vec![
        (MANUAL_CLEANUP_TAG.to_string(), "true".to_string()),
        (
            ATTEMPTED_CLEANUP_TIME_TAG.to_string(),
            now.to_rfc3339_opts(SecondsFormat::Secs, true),
        ),
    ];
    if !error_excerpt.is_empty() {
        tags.push((DELETION_ERROR_TAG.to_string(), error_excerpt.to_string()));
    }
    tags
}
