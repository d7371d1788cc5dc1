use std::fmt;

use crate::ItemOutcome;

/// Totals reported at the end of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Identifiers left after the minimum-id filter.
    pub candidates: usize,
    /// Identifiers already present in the output store at startup.
    pub already_done: usize,
    /// Candidates not yet checkpointed.
    pub queued: usize,
    pub checked: usize,
    pub written: usize,
    pub filtered_out: usize,
    pub unavailable: usize,
    pub rejected_status: usize,
    pub dropped: usize,
    pub write_failures: usize,
}

impl RunSummary {
    pub fn record(&mut self, outcome: &ItemOutcome) {
        self.checked += 1;
        match outcome {
            ItemOutcome::Written => self.written += 1,
            ItemOutcome::FilteredOut(_) => self.filtered_out += 1,
            ItemOutcome::Unavailable => self.unavailable += 1,
            ItemOutcome::RejectedStatus(_) => self.rejected_status += 1,
            ItemOutcome::Dropped { .. } => self.dropped += 1,
            ItemOutcome::WriteFailed => self.write_failures += 1,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.checked == self.queued
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "candidates={} already_done={} queued={} checked={} written={} filtered_out={} \
             unavailable={} rejected_status={} dropped={} write_failures={}",
            self.candidates,
            self.already_done,
            self.queued,
            self.checked,
            self.written,
            self.filtered_out,
            self.unavailable,
            self.rejected_status,
            self.dropped,
            self.write_failures,
        )
    }
}
