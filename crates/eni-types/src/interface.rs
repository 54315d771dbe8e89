//! Network interface snapshot types.

use crate::ParseError;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Provider-reported lifecycle state of a network interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InterfaceStatus {
    /// Not attached to anything; the only reclaimable state.
    Available,
    /// Attached to a running resource.
    InUse,
    /// Attach in progress.
    Attaching,
    /// Detach in progress (the provider's own teardown may still be running).
    Detaching,
    /// Associated with a trunk or managed attachment.
    Associated,
}

impl InterfaceStatus {
    /// Returns true if the interface is in the reclaimable state.
    pub const fn is_available(&self) -> bool {
        matches!(self, InterfaceStatus::Available)
    }
}

impl fmt::Display for InterfaceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            InterfaceStatus::Available => "available",
            InterfaceStatus::InUse => "in-use",
            InterfaceStatus::Attaching => "attaching",
            InterfaceStatus::Detaching => "detaching",
            InterfaceStatus::Associated => "associated",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for InterfaceStatus {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "available" => Ok(InterfaceStatus::Available),
            "in-use" | "in_use" | "inuse" => Ok(InterfaceStatus::InUse),
            "attaching" => Ok(InterfaceStatus::Attaching),
            "detaching" => Ok(InterfaceStatus::Detaching),
            "associated" => Ok(InterfaceStatus::Associated),
            _ => Err(ParseError::InvalidInterfaceStatus(s.to_string())),
        }
    }
}

/// State of an interface attachment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttachmentState {
    Attaching,
    Attached,
    Detaching,
    Detached,
}

impl fmt::Display for AttachmentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AttachmentState::Attaching => "attaching",
            AttachmentState::Attached => "attached",
            AttachmentState::Detaching => "detaching",
            AttachmentState::Detached => "detached",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for AttachmentState {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "attaching" => Ok(AttachmentState::Attaching),
            "attached" => Ok(AttachmentState::Attached),
            "detaching" => Ok(AttachmentState::Detaching),
            "detached" => Ok(AttachmentState::Detached),
            _ => Err(ParseError::InvalidAttachmentState(s.to_string())),
        }
    }
}

/// Attachment of an interface to a compute resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub attachment_id: String,
    pub status: Option<AttachmentState>,
}

impl Attachment {
    pub fn new(attachment_id: impl Into<String>, status: Option<AttachmentState>) -> Self {
        Self {
            attachment_id: attachment_id.into(),
            status,
        }
    }

    /// Returns true if a detach request has to be issued before deletion.
    ///
    /// Only attachments with a known, non-`detached` state and a usable
    /// attachment id qualify.
    pub fn needs_detach(&self) -> bool {
        !self.attachment_id.is_empty()
            && matches!(self.status, Some(state) if state != AttachmentState::Detached)
    }
}

/// Point-in-time snapshot of one network interface.
///
/// A record is only valid for the pass that produced it: the provider is
/// the source of truth, so anything destructive re-reads the interface
/// first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkInterfaceRecord {
    pub id: String,
    pub region: String,
    pub vpc_id: Option<String>,
    pub subnet_id: Option<String>,
    pub availability_zone: Option<String>,
    pub description: Option<String>,
    pub status: InterfaceStatus,
    pub attachment: Option<Attachment>,
    pub tags: BTreeMap<String, String>,
    pub security_group_ids: Vec<String>,
    /// Timestamp of the detection pass that observed this interface.
    pub observed_at: DateTime<Utc>,
    /// Creation time, when the provider exposes it. Most providers don't.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl NetworkInterfaceRecord {
    /// Creates a bare record observed now.
    pub fn new(id: impl Into<String>, region: impl Into<String>, status: InterfaceStatus) -> Self {
        Self {
            id: id.into(),
            region: region.into(),
            vpc_id: None,
            subnet_id: None,
            availability_zone: None,
            description: None,
            status,
            attachment: None,
            tags: BTreeMap::new(),
            security_group_ids: Vec::new(),
            observed_at: Utc::now(),
            created_at: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_vpc(mut self, vpc_id: impl Into<String>) -> Self {
        self.vpc_id = Some(vpc_id.into());
        self
    }

    pub fn with_subnet(mut self, subnet_id: impl Into<String>) -> Self {
        self.subnet_id = Some(subnet_id.into());
        self
    }

    pub fn with_availability_zone(mut self, az: impl Into<String>) -> Self {
        self.availability_zone = Some(az.into());
        self
    }

    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.attachment = Some(attachment);
        self
    }

    /// Sets the security groups, dropping duplicates while keeping order.
    pub fn with_security_groups<I, S>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.security_group_ids.clear();
        for group in groups {
            let group = group.into();
            if !self.security_group_ids.contains(&group) {
                self.security_group_ids.push(group);
            }
        }
        self
    }

    pub fn with_observed_at(mut self, observed_at: DateTime<Utc>) -> Self {
        self.observed_at = observed_at;
        self
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }

    /// Returns true if any of the given keys is present as a tag key.
    pub fn has_any_tag_key<S: AsRef<str>>(&self, keys: &[S]) -> bool {
        keys.iter().any(|k| self.tags.contains_key(k.as_ref()))
    }

    /// Returns true if any tag key starts with one of the given prefixes.
    pub fn has_tag_key_prefix<S: AsRef<str>>(&self, prefixes: &[S]) -> bool {
        self.tags
            .keys()
            .any(|k| prefixes.iter().any(|p| k.starts_with(p.as_ref())))
    }

    pub fn has_security_group(&self, group_id: &str) -> bool {
        self.security_group_ids.iter().any(|g| g == group_id)
    }

    /// Age relative to the detection pass, if the creation time is known.
    pub fn age(&self) -> Option<Duration> {
        self.created_at.map(|created| self.observed_at - created)
    }

    /// Returns true if the current attachment must be detached first.
    pub fn needs_detach(&self) -> bool {
        self.attachment.as_ref().is_some_and(Attachment::needs_detach)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_interface_status_parse() {
        assert_eq!("available".parse::<InterfaceStatus>().unwrap(), InterfaceStatus::Available);
        assert_eq!("in-use".parse::<InterfaceStatus>().unwrap(), InterfaceStatus::InUse);
        assert_eq!("DETACHING".parse::<InterfaceStatus>().unwrap(), InterfaceStatus::Detaching);
        assert!("bogus".parse::<InterfaceStatus>().is_err());
    }

    #[test]
    fn test_interface_status_display_round_trip() {
        for status in [
            InterfaceStatus::Available,
            InterfaceStatus::InUse,
            InterfaceStatus::Attaching,
            InterfaceStatus::Detaching,
            InterfaceStatus::Associated,
        ] {
            assert_eq!(status.to_string().parse::<InterfaceStatus>().unwrap(), status);
        }
    }

    #[test]
    fn test_needs_detach() {
        let attached = Attachment::new("eni-attach-1", Some(AttachmentState::Attached));
        assert!(attached.needs_detach());

        let detached = Attachment::new("eni-attach-1", Some(AttachmentState::Detached));
        assert!(!detached.needs_detach());

        let unknown = Attachment::new("eni-attach-1", None);
        assert!(!unknown.needs_detach());

        let no_id = Attachment::new("", Some(AttachmentState::Attached));
        assert!(!no_id.needs_detach());
    }

    #[test]
    fn test_security_groups_deduplicated() {
        let record = NetworkInterfaceRecord::new("eni-1", "us-east-1", InterfaceStatus::Available)
            .with_security_groups(["sg-a", "sg-b", "sg-a"]);
        assert_eq!(record.security_group_ids, vec!["sg-a", "sg-b"]);
        assert!(record.has_security_group("sg-b"));
        assert!(!record.has_security_group("sg-c"));
    }

    #[test]
    fn test_tag_lookups() {
        let record = NetworkInterfaceRecord::new("eni-1", "us-east-1", InterfaceStatus::Available)
            .with_tag("kubernetes.io/cluster/prod", "owned")
            .with_tag("Team", "net");
        assert!(record.has_any_tag_key(&["Team"]));
        assert!(!record.has_any_tag_key(&["DoNotDelete"]));
        assert!(record.has_tag_key_prefix(&["kubernetes.io/cluster/"]));
    }

    #[test]
    fn test_age_requires_creation_time() {
        let observed = Utc.with_ymd_and_hms(2024, 5, 10, 0, 0, 0).unwrap();
        let record = NetworkInterfaceRecord::new("eni-1", "us-east-1", InterfaceStatus::Available)
            .with_observed_at(observed);
        assert!(record.age().is_none());

        let record = record.with_created_at(Utc.with_ymd_and_hms(2024, 5, 7, 0, 0, 0).unwrap());
        assert_eq!(record.age().unwrap().num_days(), 3);
    }
}
