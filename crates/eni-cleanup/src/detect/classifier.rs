//! Orphan classification.
//!
//! Pure rules over a single snapshot, applied in order; the first rule that
//! matches decides.

use super::types::{Reason, Verdict};
use crate::config::FilterConfig;
use eni_types::NetworkInterfaceRecord;
use tracing::warn;

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Decides whether `record` is safe to reclaim.
pub fn is_orphan_candidate(record: &NetworkInterfaceRecord, filter: &FilterConfig) -> Verdict {
    // Detaching is treated as not-yet-orphaned so we never race the
    // provider's own teardown.
    if !record.status.is_available() {
        return Verdict::keep(Reason::NotAvailable(record.status));
    }

    if let Some(description) = record.description.as_deref() {
        if let Some(marker) = filter.reserved_markers().find(|m| description.contains(m)) {
            return Verdict::keep(Reason::ReservedDescription(marker.to_string()));
        }
    }

    if !filter.exclude_tag_keys.is_empty() && record.has_any_tag_key(&filter.exclude_tag_keys) {
        return Verdict::keep(Reason::ExcludedByTag);
    }

    if !filter.include_tag_keys.is_empty() && !record.has_any_tag_key(&filter.include_tag_keys) {
        return Verdict::keep(Reason::NotIncludedByTag);
    }

    if let Some(days) = filter.older_than_days {
        match record.age() {
            Some(age) => {
                let age_days = age.num_seconds() as f64 / SECONDS_PER_DAY;
                if age_days < days {
                    return Verdict::keep(Reason::TooRecent);
                }
            }
            None => warn!(
                eni = %record.id,
                region = %record.region,
                "Creation time unknown, age filter skipped"
            ),
        }
    }

    if !filter.orphan_tag_prefixes.is_empty() && record.has_tag_key_prefix(&filter.orphan_tag_prefixes) {
        return Verdict::orphan(Reason::OrphanTagPattern);
    }

    Verdict::orphan(Reason::AvailableAndUnreserved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use eni_types::{Attachment, AttachmentState, InterfaceStatus};
    use pretty_assertions::assert_eq;

    fn eni(id: &str, status: InterfaceStatus) -> NetworkInterfaceRecord {
        NetworkInterfaceRecord::new(id, "us-east-1", status)
    }

    #[test]
    fn test_non_available_never_orphaned() {
        let filter = FilterConfig::default();
        for status in [
            InterfaceStatus::InUse,
            InterfaceStatus::Attaching,
            InterfaceStatus::Detaching,
            InterfaceStatus::Associated,
        ] {
            let record = eni("eni-1", status)
                .with_description("Test ENI")
                .with_attachment(Attachment::new("eni-attach-1", Some(AttachmentState::Attached)));
            let verdict = is_orphan_candidate(&record, &filter);
            assert!(!verdict.orphan, "{} must not be a candidate", status);
            assert_eq!(verdict.reason, Reason::NotAvailable(status));
        }
    }

    #[test]
    fn test_available_unreserved_is_orphan() {
        let record = eni("eni-1", InterfaceStatus::Available).with_description("Test ENI");
        let verdict = is_orphan_candidate(&record, &FilterConfig::default());
        assert_eq!(verdict, Verdict::orphan(Reason::AvailableAndUnreserved));
    }

    #[test]
    fn test_no_description_is_orphan() {
        let record = eni("eni-1", InterfaceStatus::Available);
        assert!(is_orphan_candidate(&record, &FilterConfig::default()).orphan);
    }

    #[test]
    fn test_reserved_description_wins_over_tags() {
        let filter = FilterConfig::default().with_include_tag_keys(["Team"]);
        let record = eni("eni-2", InterfaceStatus::Available)
            .with_description("Amazon EKS ENI")
            .with_tag("Team", "platform");
        let verdict = is_orphan_candidate(&record, &filter);
        assert!(!verdict.orphan);
        assert_eq!(verdict.reason, Reason::ReservedDescription("Amazon EKS".to_string()));
    }

    #[test]
    fn test_reserved_markers_cover_managed_services() {
        let filter = FilterConfig::default();
        for description in [
            "ELB app/my-alb/50dc6c495c0c9188",
            "Interface for NAT Gateway nat-0123",
            "AWS-mgmt interface",
            "Kubernetes.io managed",
        ] {
            let record = eni("eni-1", InterfaceStatus::Available).with_description(description);
            assert!(!is_orphan_candidate(&record, &filter).orphan, "{}", description);
        }
    }

    #[test]
    fn test_extra_reserved_description() {
        let filter = FilterConfig {
            reserved_descriptions: vec!["AWS Lambda VPC ENI".to_string()],
            ..FilterConfig::default()
        };
        let record =
            eni("eni-1", InterfaceStatus::Available).with_description("AWS Lambda VPC ENI-my-fn");
        assert!(!is_orphan_candidate(&record, &filter).orphan);
    }

    #[test]
    fn test_exclude_tag_keys() {
        let filter = FilterConfig::default().with_exclude_tag_keys(["DoNotDelete"]);
        let tagged = eni("eni-1", InterfaceStatus::Available).with_tag("DoNotDelete", "true");
        let verdict = is_orphan_candidate(&tagged, &filter);
        assert_eq!(verdict, Verdict::keep(Reason::ExcludedByTag));

        let untagged = eni("eni-2", InterfaceStatus::Available);
        assert!(is_orphan_candidate(&untagged, &filter).orphan);
    }

    #[test]
    fn test_include_tag_keys() {
        let filter = FilterConfig::default().with_include_tag_keys(["CreatedBy"]);
        let untagged = eni("eni-1", InterfaceStatus::Available).with_tag("Owner", "me");
        assert_eq!(
            is_orphan_candidate(&untagged, &filter),
            Verdict::keep(Reason::NotIncludedByTag)
        );

        let tagged = eni("eni-2", InterfaceStatus::Available).with_tag("CreatedBy", "stack");
        assert!(is_orphan_candidate(&tagged, &filter).orphan);
    }

    #[test]
    fn test_exclude_checked_before_include() {
        let filter = FilterConfig::default()
            .with_include_tag_keys(["CreatedBy"])
            .with_exclude_tag_keys(["DoNotDelete"]);
        let record = eni("eni-1", InterfaceStatus::Available)
            .with_tag("CreatedBy", "stack")
            .with_tag("DoNotDelete", "true");
        assert_eq!(is_orphan_candidate(&record, &filter).reason, Reason::ExcludedByTag);
    }

    #[test]
    fn test_age_filter_with_known_creation_time() {
        let observed = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let filter = FilterConfig::default().with_older_than_days(7.0);

        let young = eni("eni-1", InterfaceStatus::Available)
            .with_observed_at(observed)
            .with_created_at(observed - Duration::days(2));
        assert_eq!(is_orphan_candidate(&young, &filter).reason, Reason::TooRecent);

        let old = eni("eni-2", InterfaceStatus::Available)
            .with_observed_at(observed)
            .with_created_at(observed - Duration::days(30));
        assert!(is_orphan_candidate(&old, &filter).orphan);
    }

    #[test]
    fn test_age_filter_skipped_without_creation_time() {
        let filter = FilterConfig::default().with_older_than_days(7.0);
        let record = eni("eni-1", InterfaceStatus::Available);
        assert_eq!(
            is_orphan_candidate(&record, &filter),
            Verdict::orphan(Reason::AvailableAndUnreserved)
        );
    }

    #[test]
    fn test_orphan_tag_pattern_is_opt_in() {
        let record = eni("eni-1", InterfaceStatus::Available)
            .with_tag("kubernetes.io/cluster/prod", "owned");

        let verdict = is_orphan_candidate(&record, &FilterConfig::default());
        assert_eq!(verdict.reason, Reason::AvailableAndUnreserved);

        let filter = FilterConfig {
            orphan_tag_prefixes: vec!["kubernetes.io/cluster/".to_string()],
            ..FilterConfig::default()
        };
        let verdict = is_orphan_candidate(&record, &filter);
        assert_eq!(verdict, Verdict::orphan(Reason::OrphanTagPattern));
    }
}
