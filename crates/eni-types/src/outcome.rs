//! Per-candidate cleanup outcomes.

use crate::{CleanupError, ParseError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Terminal action taken for one candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CleanupAction {
    Skipped,
    Disassociated,
    Deleted,
    DisassociatedDeleteFailed,
    TaggedForManualReview,
    Error,
}

/// Bucket a [`CleanupAction`] is counted under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeCategory {
    Success,
    Failure,
    Skipped,
}

impl CleanupAction {
    /// Counting rule used by summaries.
    ///
    /// `TaggedForManualReview` is residual cleanup debt and counts as a
    /// failure, never as skipped.
    pub const fn category(&self) -> OutcomeCategory {
        match self {
            CleanupAction::Deleted | CleanupAction::Disassociated => OutcomeCategory::Success,
            CleanupAction::Error
            | CleanupAction::DisassociatedDeleteFailed
            | CleanupAction::TaggedForManualReview => OutcomeCategory::Failure,
            CleanupAction::Skipped => OutcomeCategory::Skipped,
        }
    }
}

impl fmt::Display for CleanupAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CleanupAction::Skipped => "skipped",
            CleanupAction::Disassociated => "disassociated",
            CleanupAction::Deleted => "deleted",
            CleanupAction::DisassociatedDeleteFailed => "disassociated_delete_failed",
            CleanupAction::TaggedForManualReview => "tagged_for_manual_review",
            CleanupAction::Error => "error",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for CleanupAction {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "skipped" => Ok(CleanupAction::Skipped),
            "disassociated" => Ok(CleanupAction::Disassociated),
            "deleted" => Ok(CleanupAction::Deleted),
            "disassociated_delete_failed" => Ok(CleanupAction::DisassociatedDeleteFailed),
            "tagged_for_manual_review" => Ok(CleanupAction::TaggedForManualReview),
            "error" => Ok(CleanupAction::Error),
            _ => Err(ParseError::InvalidCleanupAction(s.to_string())),
        }
    }
}

/// What a dry run would have done to a candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "plan", rename_all = "snake_case")]
pub enum PlannedAction {
    /// Delete the interface, detaching it first if `detach` is set.
    Delete { detach: Option<String> },
    /// Replace the security groups with `groups`, detaching first if needed.
    Disassociate {
        detach: Option<String>,
        groups: Vec<String>,
    },
}

impl fmt::Display for PlannedAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let detach = match self {
            PlannedAction::Delete { detach } | PlannedAction::Disassociate { detach, .. } => detach,
        };
        if let Some(attachment_id) = detach {
            write!(f, "detach (attachment {}), then ", attachment_id)?;
        }
        match self {
            PlannedAction::Delete { .. } => write!(f, "delete"),
            PlannedAction::Disassociate { groups, .. } if groups.is_empty() => {
                write!(f, "remove all security groups")
            }
            PlannedAction::Disassociate { groups, .. } => {
                write!(f, "set security groups to [{}]", groups.join(", "))
            }
        }
    }
}

/// Result of processing one candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanupOutcome {
    pub id: String,
    pub region: String,
    pub action: CleanupAction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<CleanupError>,
    /// Why the candidate was skipped, for `Skipped` outcomes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Dry-run plan.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub planned: Option<PlannedAction>,
    /// Whether the manual-review tags were written.
    #[serde(default)]
    pub manual_review_tagged: bool,
    /// Human-readable lines, one per significant action, in order.
    #[serde(default)]
    pub log: Vec<String>,
}

impl CleanupOutcome {
    pub fn new(id: impl Into<String>, region: impl Into<String>, action: CleanupAction) -> Self {
        Self {
            id: id.into(),
            region: region.into(),
            action,
            error: None,
            reason: None,
            planned: None,
            manual_review_tagged: false,
            log: Vec::new(),
        }
    }

    pub fn skipped(id: impl Into<String>, region: impl Into<String>, reason: impl Into<String>) -> Self {
        let mut outcome = Self::new(id, region, CleanupAction::Skipped);
        outcome.reason = Some(reason.into());
        outcome
    }

    pub fn failed(id: impl Into<String>, region: impl Into<String>, error: CleanupError) -> Self {
        let mut outcome = Self::new(id, region, CleanupAction::Error);
        outcome.error = Some(error);
        outcome
    }

    pub fn with_error(mut self, error: CleanupError) -> Self {
        self.error = Some(error);
        self
    }

    pub fn with_plan(mut self, plan: PlannedAction) -> Self {
        self.planned = Some(plan);
        self
    }

    pub fn with_log(mut self, log: Vec<String>) -> Self {
        self.log = log;
        self
    }

    pub fn category(&self) -> OutcomeCategory {
        self.action.category()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_category_mapping() {
        assert_eq!(CleanupAction::Deleted.category(), OutcomeCategory::Success);
        assert_eq!(CleanupAction::Disassociated.category(), OutcomeCategory::Success);
        assert_eq!(CleanupAction::Error.category(), OutcomeCategory::Failure);
        assert_eq!(
            CleanupAction::DisassociatedDeleteFailed.category(),
            OutcomeCategory::Failure
        );
        assert_eq!(
            CleanupAction::TaggedForManualReview.category(),
            OutcomeCategory::Failure
        );
        assert_eq!(CleanupAction::Skipped.category(), OutcomeCategory::Skipped);
    }

    #[test]
    fn test_action_parse_round_trip() {
        for action in [
            CleanupAction::Skipped,
            CleanupAction::Disassociated,
            CleanupAction::Deleted,
            CleanupAction::DisassociatedDeleteFailed,
            CleanupAction::TaggedForManualReview,
            CleanupAction::Error,
        ] {
            assert_eq!(action.to_string().parse::<CleanupAction>().unwrap(), action);
        }
        assert!("nuked".parse::<CleanupAction>().is_err());
    }

    #[test]
    fn test_planned_action_display() {
        let plan = PlannedAction::Delete {
            detach: Some("eni-attach-1".to_string()),
        };
        assert_eq!(plan.to_string(), "detach (attachment eni-attach-1), then delete");

        let plan = PlannedAction::Disassociate {
            detach: None,
            groups: vec![],
        };
        assert_eq!(plan.to_string(), "remove all security groups");

        let plan = PlannedAction::Disassociate {
            detach: None,
            groups: vec!["sg-default".to_string()],
        };
        assert_eq!(plan.to_string(), "set security groups to [sg-default]");
    }

    #[test]
    fn test_outcome_serialization() {
        let outcome = CleanupOutcome::skipped("eni-1", "us-east-1", "excluded by tag");
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["action"], "skipped");
        assert_eq!(json["reason"], "excluded by tag");
        assert!(json.get("error").is_none());
    }
}
