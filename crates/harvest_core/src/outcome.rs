use std::fmt;

use crate::Rejection;

/// Terminal result of processing one identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemOutcome {
    /// Accepted and durably appended to the output store.
    Written,
    FilteredOut(Rejection),
    /// `success=false`, missing entry, or an unreadable payload.
    Unavailable,
    /// Non-retryable HTTP status.
    RejectedStatus(u16),
    /// Retry budget exhausted.
    Dropped { attempts: u32 },
    /// Accepted but the sink refused the write.
    WriteFailed,
}

impl fmt::Display for ItemOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemOutcome::Written => write!(f, "written"),
            ItemOutcome::FilteredOut(reason) => write!(f, "filtered out ({reason})"),
            ItemOutcome::Unavailable => write!(f, "unavailable"),
            ItemOutcome::RejectedStatus(code) => write!(f, "rejected with http status {code}"),
            ItemOutcome::Dropped { attempts } => write!(f, "dropped after {attempts} attempts"),
            ItemOutcome::WriteFailed => write!(f, "write failed"),
        }
    }
}
