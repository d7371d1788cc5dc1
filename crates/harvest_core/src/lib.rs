//! Harvest core: pure catalog types, filter rules and run bookkeeping.
mod criteria;
mod details;
mod filter;
mod outcome;
mod record;
mod summary;

pub use criteria::{
    FilterCriteria, DEFAULT_ITEM_TYPE, DEFAULT_MIN_APP_ID, DEFAULT_YEAR_END, DEFAULT_YEAR_START,
};
pub use details::{AppDetails, Descriptor, PriceOverview, Recommendations, ReleaseDate};
pub use filter::{parse_release_year, RecordFilter, Rejection};
pub use outcome::ItemOutcome;
pub use record::{AcceptedRecord, CheckpointEntry};
pub use summary::RunSummary;

/// Catalog item identifier. Positive, totally ordered, unique within a catalog snapshot.
pub type AppId = u64;
