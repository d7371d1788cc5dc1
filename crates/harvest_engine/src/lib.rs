//! Harvest engine: catalog listing, detail fetching, retries and durable output.
mod checkpoint;
mod fetch;
mod harvest;
mod paginator;
mod persist;
mod pool;
mod retry;
mod types;
mod writer;

pub use checkpoint::{CheckpointScan, CheckpointStore};
pub use fetch::{
    CatalogLister, DetailFetcher, DetailSettings, ListingSettings, NullProgress, ProgressSink,
    StoreClient,
};
pub use harvest::{run_harvest, HarvestConfig};
pub use paginator::CatalogPaginator;
pub use persist::{ensure_output_dir, JsonlSink, PersistError};
pub use pool::WorkerPool;
pub use retry::{AttemptOutcome, RetryPolicy};
pub use types::{CatalogPage, DetailPayload, EngineEvent, FailureKind, FetchError, ListingStop};
pub use writer::SinkHandle;
