//! Fallback cleanup: the orchestrator and its per-candidate workers.

mod orch;
mod plan;
mod worker;

pub use orch::CleanupOrch;
pub use plan::{manual_review_tags, plan_for, remaining_groups};
