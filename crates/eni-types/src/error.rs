//! Structured cleanup errors.
//!
//! These are recorded on outcomes and region reports rather than
//! propagated: a failure on one candidate never aborts its siblings.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Longest value the provider accepts for a tag.
pub const TAG_VALUE_MAX_LEN: usize = 255;

/// Errors recorded against a single candidate or region.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CleanupError {
    /// Client construction or listing failed for a region.
    #[error("Region '{region}' unavailable: {message}")]
    RegionUnavailable { region: String, message: String },

    /// Re-reading the interface before mutation failed.
    #[error("Failed to look up ENI {id}: {message}")]
    LookupFailed { id: String, message: String },

    /// The provider rejected or timed out a detach request.
    #[error("Failed to detach ENI {id} (attachment {attachment_id}): {message}")]
    DetachFailed {
        id: String,
        attachment_id: String,
        message: String,
    },

    /// Security-group update failed.
    #[error("Failed to modify security groups for ENI {id}: {message}")]
    ModifyGroupsFailed { id: String, message: String },

    /// The first delete attempt was rejected.
    #[error("Failed to delete ENI {id}: {message}")]
    DeleteFailed { id: String, message: String },

    /// Delete still failed after the security groups were removed.
    #[error("Could not delete ENI {id} after removing security groups: {message}")]
    DeleteFailedAfterFallback { id: String, message: String },

    /// Writing the manual-review tags failed.
    #[error("Failed to tag ENI {id} for manual cleanup: {message}")]
    TagFailed { id: String, message: String },

    /// The run was cancelled before this candidate was started.
    #[error("Cleanup of ENI {id} not started: run cancelled")]
    Cancelled { id: String },

    /// The worker processing this candidate died.
    #[error("Worker for ENI {id} panicked: {message}")]
    WorkerPanicked { id: String, message: String },
}

/// Discriminant of [`CleanupError`], for matching without the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    RegionUnavailable,
    LookupFailed,
    DetachFailed,
    ModifyGroupsFailed,
    DeleteFailed,
    DeleteFailedAfterFallback,
    TagFailed,
    Cancelled,
    WorkerPanicked,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::RegionUnavailable => "region_unavailable",
            ErrorKind::LookupFailed => "lookup_failed",
            ErrorKind::DetachFailed => "detach_failed",
            ErrorKind::ModifyGroupsFailed => "modify_groups_failed",
            ErrorKind::DeleteFailed => "delete_failed",
            ErrorKind::DeleteFailedAfterFallback => "delete_failed_after_fallback",
            ErrorKind::TagFailed => "tag_failed",
            ErrorKind::Cancelled => "cancelled",
            ErrorKind::WorkerPanicked => "worker_panicked",
        };
        write!(f, "{}", s)
    }
}

impl CleanupError {
    /// Creates a region unavailable error.
    pub fn region_unavailable(region: impl Into<String>, message: impl Into<String>) -> Self {
        Self::RegionUnavailable {
            region: region.into(),
            message: message.into(),
        }
    }

    /// Creates a lookup error.
    pub fn lookup_failed(id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::LookupFailed {
            id: id.into(),
            message: message.into(),
        }
    }

    /// Creates a detach error.
    pub fn detach_failed(
        id: impl Into<String>,
        attachment_id: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::DetachFailed {
            id: id.into(),
            attachment_id: attachment_id.into(),
            message: message.into(),
        }
    }

    /// Creates a security-group modification error.
    pub fn modify_groups_failed(id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ModifyGroupsFailed {
            id: id.into(),
            message: message.into(),
        }
    }

    /// Creates a delete error.
    pub fn delete_failed(id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::DeleteFailed {
            id: id.into(),
            message: message.into(),
        }
    }

    /// Creates a delete-after-fallback error.
    pub fn delete_failed_after_fallback(id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::DeleteFailedAfterFallback {
            id: id.into(),
            message: message.into(),
        }
    }

    /// Creates a tagging error.
    pub fn tag_failed(id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::TagFailed {
            id: id.into(),
            message: message.into(),
        }
    }

    /// Creates a cancellation marker.
    pub fn cancelled(id: impl Into<String>) -> Self {
        Self::Cancelled { id: id.into() }
    }

    /// Creates a worker failure.
    pub fn worker_panicked(id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::WorkerPanicked {
            id: id.into(),
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            CleanupError::RegionUnavailable { .. } => ErrorKind::RegionUnavailable,
            CleanupError::LookupFailed { .. } => ErrorKind::LookupFailed,
            CleanupError::DetachFailed { .. } => ErrorKind::DetachFailed,
            CleanupError::ModifyGroupsFailed { .. } => ErrorKind::ModifyGroupsFailed,
            CleanupError::DeleteFailed { .. } => ErrorKind::DeleteFailed,
            CleanupError::DeleteFailedAfterFallback { .. } => ErrorKind::DeleteFailedAfterFallback,
            CleanupError::TagFailed { .. } => ErrorKind::TagFailed,
            CleanupError::Cancelled { .. } => ErrorKind::Cancelled,
            CleanupError::WorkerPanicked { .. } => ErrorKind::WorkerPanicked,
        }
    }

    /// Returns the provider message carried by this error, if any.
    pub fn message(&self) -> Option<&str> {
        match self {
            CleanupError::RegionUnavailable { message, .. }
            | CleanupError::LookupFailed { message, .. }
            | CleanupError::DetachFailed { message, .. }
            | CleanupError::ModifyGroupsFailed { message, .. }
            | CleanupError::DeleteFailed { message, .. }
            | CleanupError::DeleteFailedAfterFallback { message, .. }
            | CleanupError::TagFailed { message, .. }
            | CleanupError::WorkerPanicked { message, .. } => Some(message),
            CleanupError::Cancelled { .. } => None,
        }
    }

    /// Provider message cut to fit in a tag value, on a char boundary.
    pub fn excerpt(&self) -> String {
        let message = self.message().unwrap_or_default();
        message.chars().take(TAG_VALUE_MAX_LEN).collect()
    }

    /// Returns true if a later run has a reasonable chance of succeeding.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CleanupError::RegionUnavailable { .. }
                | CleanupError::LookupFailed { .. }
                | CleanupError::DetachFailed { .. }
                | CleanupError::Cancelled { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CleanupError::detach_failed("eni-1", "eni-attach-9", "IncorrectState");
        assert_eq!(
            err.to_string(),
            "Failed to detach ENI eni-1 (attachment eni-attach-9): IncorrectState"
        );
    }

    #[test]
    fn test_kind() {
        assert_eq!(
            CleanupError::delete_failed_after_fallback("eni-1", "x").kind(),
            ErrorKind::DeleteFailedAfterFallback
        );
        assert_eq!(CleanupError::cancelled("eni-1").kind(), ErrorKind::Cancelled);
        assert_eq!(ErrorKind::ModifyGroupsFailed.to_string(), "modify_groups_failed");
    }

    #[test]
    fn test_excerpt_truncates_on_char_boundary() {
        let long = "é".repeat(400);
        let err = CleanupError::delete_failed("eni-1", long);
        let excerpt = err.excerpt();
        assert_eq!(excerpt.chars().count(), TAG_VALUE_MAX_LEN);

        assert_eq!(CleanupError::cancelled("eni-1").excerpt(), "");
    }

    #[test]
    fn test_serialized_with_kind_tag() {
        let err = CleanupError::modify_groups_failed("eni-3", "InvalidGroup.NotFound");
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["kind"], "modify_groups_failed");
        assert_eq!(json["id"], "eni-3");
    }

    #[test]
    fn test_is_retryable() {
        assert!(CleanupError::region_unavailable("us-east-1", "timeout").is_retryable());
        assert!(!CleanupError::tag_failed("eni-1", "denied").is_retryable());
    }
}
