//! Verification helpers
//!
//! Assertion helpers over cleanup summaries and provider-side tags.

use crate::InMemoryGateway;
use eni_cleanup::{ATTEMPTED_CLEANUP_TIME_TAG, MANUAL_CLEANUP_TAG};
use eni_types::{CleanupAction, CleanupSummary, ErrorKind, OutcomeCategory};
use thiserror::Error;

/// Verification error types
#[derive(Error, Debug)]
pub enum VerificationError {
    #[error("Expected (success, failure, skipped) = {expected:?}, got {actual:?}")]
    CountMismatch {
        expected: (usize, usize, usize),
        actual: (usize, usize, usize),
    },

    #[error("No outcome for ENI '{id}'")]
    OutcomeNotFound { id: String },

    #[error("ENI '{id}': expected {expected}, got {actual}")]
    ActionMismatch {
        id: String,
        expected: CleanupAction,
        actual: CleanupAction,
    },

    #[error("ENI '{id}': expected error kind {expected}, got {actual:?}")]
    ErrorKindMismatch {
        id: String,
        expected: ErrorKind,
        actual: Option<ErrorKind>,
    },

    #[error("Counters disagree with outcomes: {0}")]
    Inconsistent(String),

    #[error("ENI '{id}' is missing tag '{tag}'")]
    TagMissing { id: String, tag: String },

    #[error("ENI '{id}' unexpectedly carries tag '{tag}'")]
    UnexpectedTag { id: String, tag: String },
}

/// Result type for verification operations
pub type VerifyResult<T> = Result<T, VerificationError>;

/// Summary verification helper
pub struct SummaryVerifier<'a> {
    summary: &'a CleanupSummary,
}

impl<'a> SummaryVerifier<'a> {
    pub fn new(summary: &'a CleanupSummary) -> Self {
        Self { summary }
    }

    /// Verify the three counters
    pub fn assert_counts(&self, success: usize, failure: usize, skipped: usize) -> VerifyResult<()> {
        let actual = (self.summary.success, self.summary.failure, self.summary.skipped);
        if actual != (success, failure, skipped) {
            return Err(VerificationError::CountMismatch {
                expected: (success, failure, skipped),
                actual,
            });
        }
        Ok(())
    }

    /// Verify the action recorded for one interface
    pub fn assert_action(&self, id: &str, expected: CleanupAction) -> VerifyResult<()> {
        let outcome = self
            .summary
            .outcome(id)
            .ok_or_else(|| VerificationError::OutcomeNotFound { id: id.to_string() })?;
        if outcome.action != expected {
            return Err(VerificationError::ActionMismatch {
                id: id.to_string(),
                expected,
                actual: outcome.action,
            });
        }
        Ok(())
    }

    /// Verify the error kind recorded for one interface
    pub fn assert_error_kind(&self, id: &str, expected: ErrorKind) -> VerifyResult<()> {
        let outcome = self
            .summary
            .outcome(id)
            .ok_or_else(|| VerificationError::OutcomeNotFound { id: id.to_string() })?;
        let actual = outcome.error.as_ref().map(|e| e.kind());
        if actual != Some(expected) {
            return Err(VerificationError::ErrorKindMismatch {
                id: id.to_string(),
                expected,
                actual,
            });
        }
        Ok(())
    }

    /// Verify that no outcome exists for an interface
    pub fn assert_absent(&self, id: &str) -> VerifyResult<()> {
        if let Some(outcome) = self.summary.outcome(id) {
            return Err(VerificationError::Inconsistent(format!(
                "unexpected outcome {} for {}",
                outcome.action, id
            )));
        }
        Ok(())
    }

    /// Verify that the counters match a recount of the outcomes
    pub fn assert_consistent(&self) -> VerifyResult<()> {
        let mut recount = (0, 0, 0);
        for outcome in &self.summary.outcomes {
            match outcome.category() {
                OutcomeCategory::Success => recount.0 += 1,
                OutcomeCategory::Failure => recount.1 += 1,
                OutcomeCategory::Skipped => recount.2 += 1,
            }
        }
        let counters = (self.summary.success, self.summary.failure, self.summary.skipped);
        if recount != counters {
            return Err(VerificationError::Inconsistent(format!(
                "counters {:?}, recount {:?}",
                counters, recount
            )));
        }
        Ok(())
    }
}

/// Verify that an interface carries the manual-review marker and timestamp
pub fn assert_manual_review_tags(gateway: &InMemoryGateway, id: &str) -> VerifyResult<()> {
    let tags = gateway.tags(id);
    for tag in [MANUAL_CLEANUP_TAG, ATTEMPTED_CLEANUP_TIME_TAG] {
        if !tags.contains_key(tag) {
            return Err(VerificationError::TagMissing {
                id: id.to_string(),
                tag: tag.to_string(),
            });
        }
    }
    Ok(())
}

/// Verify that an interface carries no manual-review marker
pub fn assert_not_tagged(gateway: &InMemoryGateway, id: &str) -> VerifyResult<()> {
    if gateway.tags(id).contains_key(MANUAL_CLEANUP_TAG) {
        return Err(VerificationError::UnexpectedTag {
            id: id.to_string(),
            tag: MANUAL_CLEANUP_TAG.to_string(),
        });
    }
    Ok(())
}
