//! Run summary.

use crate::{CleanupAction, CleanupOutcome, OutcomeCategory};
use serde::{Deserialize, Serialize};

/// Counts plus every outcome of one cleanup run.
///
/// The counters are always consistent with `outcomes`: each outcome is
/// counted exactly once, under [`CleanupAction::category`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanupSummary {
    pub success: usize,
    pub failure: usize,
    pub skipped: usize,
    pub outcomes: Vec<CleanupOutcome>,
}

impl CleanupSummary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts and stores one outcome.
    pub fn record(&mut self, outcome: CleanupOutcome) {
        match outcome.category() {
            OutcomeCategory::Success => self.success += 1,
            OutcomeCategory::Failure => self.failure += 1,
            OutcomeCategory::Skipped => self.skipped += 1,
        }
        self.outcomes.push(outcome);
    }

    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    pub fn has_failures(&self) -> bool {
        self.failure > 0
    }

    /// Number of outcomes with the given action.
    pub fn count(&self, action: CleanupAction) -> usize {
        self.outcomes.iter().filter(|o| o.action == action).count()
    }

    /// Outcome for the given interface id, if present.
    pub fn outcome(&self, id: &str) -> Option<&CleanupOutcome> {
        self.outcomes.iter().find(|o| o.id == id)
    }

    /// Per-action log lines, in candidate order.
    pub fn log_lines(&self) -> impl Iterator<Item = &str> {
        self.outcomes
            .iter()
            .flat_map(|o| o.log.iter().map(String::as_str))
    }

    /// Appends another summary (e.g. another region's) to this one.
    pub fn merge(&mut self, other: CleanupSummary) {
        for outcome in other.outcomes {
            self.record(outcome);
        }
    }
}

impl FromIterator<CleanupOutcome> for CleanupSummary {
    fn from_iter<I: IntoIterator<Item = CleanupOutcome>>(iter: I) -> Self {
        let mut summary = Self::new();
        for outcome in iter {
            summary.record(outcome);
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CleanupError;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_counts_follow_categories() {
        let summary: CleanupSummary = [
            CleanupOutcome::new("eni-1", "us-east-1", CleanupAction::Deleted),
            CleanupOutcome::new("eni-2", "us-east-1", CleanupAction::Disassociated),
            CleanupOutcome::new("eni-3", "us-east-1", CleanupAction::TaggedForManualReview),
            CleanupOutcome::new("eni-4", "us-east-1", CleanupAction::DisassociatedDeleteFailed),
            CleanupOutcome::failed(
                "eni-5",
                "us-east-1",
                CleanupError::detach_failed("eni-5", "eni-attach-5", "throttled"),
            ),
            CleanupOutcome::skipped("eni-6", "us-east-1", "excluded by tag"),
        ]
        .into_iter()
        .collect();

        assert_eq!(summary.success, 2);
        assert_eq!(summary.failure, 3);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.total(), 6);
        assert!(summary.has_failures());
        assert_eq!(summary.count(CleanupAction::TaggedForManualReview), 1);
    }

    #[test]
    fn test_log_lines_in_order() {
        let summary: CleanupSummary = [
            CleanupOutcome::new("eni-1", "us-east-1", CleanupAction::Deleted)
                .with_log(vec!["a".to_string(), "b".to_string()]),
            CleanupOutcome::skipped("eni-2", "us-east-1", "gone").with_log(vec!["c".to_string()]),
        ]
        .into_iter()
        .collect();

        let lines: Vec<&str> = summary.log_lines().collect();
        assert_eq!(lines, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_merge() {
        let mut a: CleanupSummary =
            std::iter::once(CleanupOutcome::new("eni-1", "us-east-1", CleanupAction::Deleted))
                .collect();
        let b: CleanupSummary =
            std::iter::once(CleanupOutcome::skipped("eni-2", "eu-west-1", "gone")).collect();
        a.merge(b);
        assert_eq!((a.success, a.failure, a.skipped), (1, 0, 1));
        assert_eq!(a.outcome("eni-2").map(|o| o.region.as_str()), Some("eu-west-1"));
    }
}
