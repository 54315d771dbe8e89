//! Result aggregation.
//!
//! Workers never share a buffer: each one hands back its outcome tagged
//! with the candidate's index and the aggregator places it in that slot.
//! The summary is built only after every worker has finished.

use eni_types::{CleanupError, CleanupOutcome, CleanupSummary};
use tracing::error;

/// One slot per input candidate.
pub struct ResultAggregator {
    slots: Vec<Slot>,
}

struct Slot {
    id: String,
    region: String,
    outcome: Option<CleanupOutcome>,
}

impl ResultAggregator {
    /// Reserves a slot for each `(id, region)` pair, in input order.
    pub fn new<I, S, R>(candidates: I) -> Self
    where
        I: IntoIterator<Item = (S, R)>,
        S: Into<String>,
        R: Into<String>,
    {
        let slots = candidates
            .into_iter()
            .map(|(id, region)| Slot {
                id: id.into(),
                region: region.into(),
                outcome: None,
            })
            .collect();
        Self { slots }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Stores the outcome for candidate `index`. The first outcome written
    /// to a slot wins.
    pub fn fill(&mut self, index: usize, outcome: CleanupOutcome) {
        match self.slots.get_mut(index) {
            Some(slot) if slot.outcome.is_none() => slot.outcome = Some(outcome),
            Some(slot) => error!(eni = %slot.id, "Duplicate outcome dropped"),
            None => error!(index, eni = %outcome.id, "Outcome for unknown candidate dropped"),
        }
    }

    /// Builds the summary in candidate order. A slot nobody filled becomes
    /// an error outcome, so the summary always holds one outcome per
    /// candidate.
    pub fn finish(self) -> CleanupSummary {
        self.slots
            .into_iter()
            .map(|slot| match slot.outcome {
                Some(outcome) => outcome,
                None => {
                    error!(eni = %slot.id, region = %slot.region, "No outcome recorded");
                    let err = CleanupError::worker_panicked(&slot.id, "no outcome recorded");
                    CleanupOutcome::failed(slot.id, slot.region, err)
                }
            })
            .collect()
    }
}
