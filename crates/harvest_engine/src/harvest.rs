use std::path::PathBuf;
use std::sync::Arc;

use engine_logging::engine_info;
use harvest_core::{FilterCriteria, RecordFilter, RunSummary};

use crate::checkpoint::CheckpointStore;
use crate::fetch::{CatalogLister, DetailFetcher, DetailSettings, ListingSettings, ProgressSink};
use crate::paginator::CatalogPaginator;
use crate::persist::{JsonlSink, PersistError};
use crate::pool::WorkerPool;
use crate::retry::RetryPolicy;
use crate::writer::SinkHandle;
use crate::EngineEvent;

/// Run-wide settings, built once at startup and never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarvestConfig {
    pub output_path: PathBuf,
    pub criteria: FilterCriteria,
    pub listing: ListingSettings,
    pub detail: DetailSettings,
    pub retry: RetryPolicy,
    pub concurrency: usize,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            output_path: PathBuf::from("steam_data_2021_2025.jsonl"),
            criteria: FilterCriteria::default(),
            listing: ListingSettings::default(),
            detail: DetailSettings::default(),
            retry: RetryPolicy::default(),
            concurrency: 5,
        }
    }
}

/// Load checkpoint, enumerate the catalog, drop completed ids, then fetch,
/// filter and append the rest.
///
/// Only failing to open the output store is an error; everything else
/// degrades into the returned summary.
pub async fn run_harvest(
    config: &HarvestConfig,
    lister: &dyn CatalogLister,
    fetcher: Arc<dyn DetailFetcher>,
    progress: &dyn ProgressSink,
) -> Result<RunSummary, PersistError> {
    let completed = CheckpointStore::new(&config.output_path).load();
    let sink = JsonlSink::open(&config.output_path)?;

    let candidates = CatalogPaginator::new(lister, &config.criteria, config.listing.page_delay)
        .enumerate(progress)
        .await;
    if candidates.is_empty() {
        engine_info!("No candidates listed; nothing to do");
        return Ok(RunSummary::default());
    }

    let candidate_count = candidates.len();
    let queue: Vec<_> = candidates
        .into_iter()
        .filter(|id| !completed.contains(id))
        .collect();
    let already_done = candidate_count - queue.len();

    engine_info!(
        "Candidates: {} | already stored: {} | to fetch: {}",
        candidate_count,
        already_done,
        queue.len()
    );
    progress.emit(EngineEvent::QueueReady {
        queued: queue.len(),
    });

    let mut summary = if queue.is_empty() {
        engine_info!("Every candidate is already stored");
        RunSummary::default()
    } else {
        let pool = WorkerPool::new(
            fetcher,
            Arc::new(RecordFilter::new(config.criteria.clone())),
            SinkHandle::spawn(sink),
            config.retry.clone(),
            config.concurrency,
        );
        pool.run(queue, progress).await
    };
    summary.candidates = candidate_count;
    summary.already_done = already_done;

    engine_info!("Harvest finished: {}", summary);
    Ok(summary)
}
