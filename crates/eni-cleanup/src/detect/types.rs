//! Detection types.

use eni_types::{CleanupError, InterfaceStatus, NetworkInterfaceRecord};
use serde::Serialize;
use std::fmt;

/// Why the classifier decided the way it did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "rule", content = "detail", rename_all = "snake_case")]
pub enum Reason {
    /// Status is not `available`.
    NotAvailable(InterfaceStatus),
    /// Description contains a reserved marker.
    ReservedDescription(String),
    /// Carries one of the exclude tag keys.
    ExcludedByTag,
    /// Carries none of the include tag keys.
    NotIncludedByTag,
    /// Younger than the age threshold.
    TooRecent,
    /// Available and carries an orphan-indicator tag.
    OrphanTagPattern,
    /// Available and not reserved.
    AvailableAndUnreserved,
}

impl Reason {
    /// Returns true if a user-supplied filter (not an eligibility rule)
    /// rejected the interface.
    pub fn is_user_filter(&self) -> bool {
        matches!(
            self,
            Reason::ExcludedByTag | Reason::NotIncludedByTag | Reason::TooRecent
        )
    }
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reason::NotAvailable(status) => write!(f, "not available (status {})", status),
            Reason::ReservedDescription(marker) => {
                write!(f, "reserved description (matches '{}')", marker)
            }
            Reason::ExcludedByTag => write!(f, "excluded by tag"),
            Reason::NotIncludedByTag => write!(f, "not included by tag"),
            Reason::TooRecent => write!(f, "younger than age threshold"),
            Reason::OrphanTagPattern => write!(f, "available with orphan-indicator tag"),
            Reason::AvailableAndUnreserved => write!(f, "available and unreserved"),
        }
    }
}

/// Classifier decision for one record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Verdict {
    pub orphan: bool,
    pub reason: Reason,
}

impl Verdict {
    pub fn orphan(reason: Reason) -> Self {
        Self { orphan: true, reason }
    }

    pub fn keep(reason: Reason) -> Self {
        Self {
            orphan: false,
            reason,
        }
    }
}

/// A record handed to the orchestrator.
///
/// Records rejected only by a user filter are still handed over so they
/// show up as skipped in the summary. Records that are ineligible (not
/// available, reserved) never become candidates.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Candidate {
    pub record: NetworkInterfaceRecord,
    pub verdict: Verdict,
}

impl Candidate {
    pub fn new(record: NetworkInterfaceRecord, verdict: Verdict) -> Self {
        Self { record, verdict }
    }

    /// Wraps a record as an actionable orphan without classifying it.
    pub fn orphan(record: NetworkInterfaceRecord) -> Self {
        Self::new(record, Verdict::orphan(Reason::AvailableAndUnreserved))
    }

    /// Returns true if cleanup should act on this candidate.
    pub fn is_actionable(&self) -> bool {
        self.verdict.orphan
    }

    pub fn id(&self) -> &str {
        &self.record.id
    }

    pub fn region(&self) -> &str {
        &self.record.region
    }
}

/// Output of one detection pass.
#[derive(Debug, Clone, Default)]
pub struct DetectionReport {
    /// Orphans and user-filtered records, grouped by region in region order,
    /// provider order within a region.
    pub candidates: Vec<Candidate>,
    /// One `RegionUnavailable` per region that could not be scanned.
    pub region_errors: Vec<CleanupError>,
    /// Interfaces listed across all regions.
    pub scanned: usize,
    /// Interfaces dropped as ineligible.
    pub ignored: usize,
}

impl DetectionReport {
    /// Number of candidates cleanup will act on.
    pub fn orphan_count(&self) -> usize {
        self.candidates.iter().filter(|c| c.is_actionable()).count()
    }

    /// Number of candidates rejected by a user filter.
    pub fn filtered_count(&self) -> usize {
        self.candidates.len() - self.orphan_count()
    }
}
