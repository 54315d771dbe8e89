//! Orphan detection: the pure classifier and the multi-region detector.

mod classifier;
mod detector;
mod types;

pub use classifier::is_orphan_candidate;
pub use detector::Detector;
pub use types::{Candidate, DetectionReport, Reason, Verdict};
