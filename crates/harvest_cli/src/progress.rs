//! Terminal progress for a harvest run.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use harvest_core::ItemOutcome;
use harvest_engine::{EngineEvent, ProgressSink};
use indicatif::{ProgressBar, ProgressStyle};

/// Spinner while listing, then a bar over checked (not written) items.
pub struct TerminalProgress {
    bar: ProgressBar,
    written: AtomicUsize,
}

impl TerminalProgress {
    pub fn new(enabled: bool) -> Self {
        let bar = if enabled {
            let bar = ProgressBar::new_spinner();
            bar.set_style(
                ProgressStyle::default_spinner()
                    .template("{spinner:.green} {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            );
            bar.enable_steady_tick(Duration::from_millis(100));
            bar.set_message("Listing catalog...");
            bar
        } else {
            ProgressBar::hidden()
        };
        Self {
            bar,
            written: AtomicUsize::new(0),
        }
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }

    fn start_items(&self, queued: usize) {
        self.bar.set_style(
            ProgressStyle::default_bar()
                .template("{msg}\n{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} ({eta})")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        self.bar.set_length(queued as u64);
        self.bar.set_position(0);
        self.bar.set_message("Checking items (0 saved)");
    }
}

impl ProgressSink for TerminalProgress {
    fn emit(&self, event: EngineEvent) {
        match event {
            EngineEvent::ListingPage { page, items, .. } => {
                self.bar
                    .set_message(format!("Listing catalog: page {page} ({items} ids)"));
            }
            EngineEvent::ListingFinished { total, .. } => {
                self.bar
                    .set_message(format!("Listing finished: {total} ids"));
            }
            EngineEvent::QueueReady { queued } => self.start_items(queued),
            EngineEvent::ItemFinished { outcome, .. } => {
                if outcome == ItemOutcome::Written {
                    let saved = self.written.fetch_add(1, Ordering::Relaxed) + 1;
                    self.bar.set_message(format!("Checking items ({saved} saved)"));
                }
                self.bar.inc(1);
            }
        }
    }
}
