//! Record fixtures
//!
//! Snapshots shaped like what the provider returns for the interfaces the
//! cleanup flow cares about.

use chrono::{DateTime, Duration, TimeZone, Utc};
use eni_types::{Attachment, AttachmentState, InterfaceStatus, NetworkInterfaceRecord};

/// Region used when a test does not care.
pub const REGION: &str = "us-east-1";

/// Fixed observation time so age filters are deterministic.
pub fn observed_at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0)
        .single()
        .unwrap_or_default()
}

/// Available, unattached, no tags, description "Test ENI".
pub fn available_eni(id: &str) -> NetworkInterfaceRecord {
    available_eni_in(id, REGION)
}

/// Same as [`available_eni`] in another region.
pub fn available_eni_in(id: &str, region: &str) -> NetworkInterfaceRecord {
    NetworkInterfaceRecord::new(id, region, InterfaceStatus::Available)
        .with_description("Test ENI")
        .with_vpc("vpc-0123")
        .with_subnet("subnet-0123")
        .with_availability_zone(format!("{}a", region))
        .with_observed_at(observed_at())
}

/// Available interface in the given security groups.
pub fn eni_with_groups(id: &str, groups: &[&str]) -> NetworkInterfaceRecord {
    available_eni(id).with_security_groups(groups.iter().copied())
}

/// Available interface still carrying an attachment that needs detaching.
pub fn attached_eni(id: &str, attachment_id: &str) -> NetworkInterfaceRecord {
    available_eni(id).with_attachment(Attachment::new(
        attachment_id,
        Some(AttachmentState::Attached),
    ))
}

/// Interface attached to a running instance.
pub fn in_use_eni(id: &str) -> NetworkInterfaceRecord {
    NetworkInterfaceRecord::new(id, REGION, InterfaceStatus::InUse)
        .with_description("Primary network interface")
        .with_attachment(Attachment::new(
            format!("{}-attach", id),
            Some(AttachmentState::Attached),
        ))
        .with_observed_at(observed_at())
}

/// Interface owned by the managed Kubernetes service.
pub fn eks_eni(id: &str) -> NetworkInterfaceRecord {
    available_eni(id).with_description("Amazon EKS ENI")
}

/// Interface created `days` before [`observed_at`].
pub fn aged_eni(id: &str, days: i64) -> NetworkInterfaceRecord {
    available_eni(id).with_created_at(observed_at() - Duration::days(days))
}

/// `count` available interfaces named `{prefix}-{n}`.
pub fn available_enis(prefix: &str, count: usize) -> Vec<NetworkInterfaceRecord> {
    (1..=count)
        .map(|n| available_eni(&format!("{}-{}", prefix, n)))
        .collect()
}
