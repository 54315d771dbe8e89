//! Common types for orphaned network-interface cleanup.
//!
//! This crate provides the data model shared by the detector, the cleanup
//! orchestrator and every calling environment:
//!
//! - [`NetworkInterfaceRecord`]: point-in-time snapshot of one interface
//! - [`InterfaceStatus`] / [`AttachmentState`]: provider lifecycle states
//! - [`CleanupAction`] / [`CleanupOutcome`]: what happened to one candidate
//! - [`CleanupSummary`]: counts and outcomes of one run
//! - [`PlannedAction`]: what a dry run would have done
//! - [`CleanupError`]: structured per-candidate / per-region failure

mod error;
mod interface;
mod outcome;
mod summary;

pub use error::{CleanupError, ErrorKind, TAG_VALUE_MAX_LEN};
pub use interface::{Attachment, AttachmentState, InterfaceStatus, NetworkInterfaceRecord};
pub use outcome::{CleanupAction, CleanupOutcome, OutcomeCategory, PlannedAction};
pub use summary::CleanupSummary;

/// Common error type for parsing failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("invalid interface status: {0}")]
    InvalidInterfaceStatus(String),

    #[error("invalid attachment state: {0}")]
    InvalidAttachmentState(String),

    #[error("invalid cleanup action: {0}")]
    InvalidCleanupAction(String),
}
