//! Run report handed back to the calling environment.

use crate::hook::HookPhase;
use chrono::{DateTime, Utc};
use eni_types::{CleanupError, CleanupSummary};
use serde::Serialize;
use std::fmt::Write as _;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanupReport {
    pub phase: HookPhase,
    pub dry_run: bool,
    pub regions: Vec<String>,
    /// Interfaces listed across all reachable regions.
    pub scanned: usize,
    /// Interfaces dropped as ineligible (in use, reserved).
    pub ignored: usize,
    pub summary: CleanupSummary,
    pub region_errors: Vec<CleanupError>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl CleanupReport {
    /// True if any candidate failed or any region could not be scanned.
    pub fn has_failures(&self) -> bool {
        self.summary.has_failures() || !self.region_errors.is_empty()
    }

    pub fn log_lines(&self) -> impl Iterator<Item = &str> {
        self.summary.log_lines()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Human-readable report.
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let mode = if self.dry_run { " (dry run)" } else { "" };
        let elapsed = self.finished_at - self.started_at;

        let _ = writeln!(
            out,
            "ENI cleanup [{}]{} in {} ({} ms)",
            self.phase,
            mode,
            self.regions.join(", "),
            elapsed.num_milliseconds()
        );
        let _ = writeln!(
            out,
            "Scanned {} interfaces, ignored {}, processed {}",
            self.scanned,
            self.ignored,
            self.summary.total()
        );
        let _ = writeln!(
            out,
            "Success: {}  Failure: {}  Skipped: {}",
            self.summary.success, self.summary.failure, self.summary.skipped
        );

        for err in &self.region_errors {
            let _ = writeln!(out, "  ! {}", err);
        }

        for outcome in &self.summary.outcomes {
            let _ = write!(out, "  {} [{}] {}", outcome.id, outcome.region, outcome.action);
            if let Some(reason) = &outcome.reason {
                let _ = write!(out, ": {}", reason);
            }
            if let Some(err) = &outcome.error {
                let _ = write!(out, " ({})", err);
            }
            out.push('\n');
            for line in &outcome.log {
                let _ = writeln!(out, "      {}", line);
            }
        }
        out
    }
}
