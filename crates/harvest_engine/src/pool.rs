use std::sync::Arc;

use engine_logging::{engine_debug, engine_error, engine_warn};
use harvest_core::{AppId, ItemOutcome, RecordFilter, RunSummary};
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};

use crate::fetch::{DetailFetcher, ProgressSink};
use crate::retry::{AttemptOutcome, RetryPolicy};
use crate::writer::SinkHandle;
use crate::EngineEvent;

/// Everything an item task needs; shared read-only across tasks.
struct ItemContext {
    fetcher: Arc<dyn DetailFetcher>,
    filter: Arc<RecordFilter>,
    sink: SinkHandle,
    policy: RetryPolicy,
}

/// Bounded-concurrency driver for per-item detail fetches.
///
/// A permit is taken before each item task is spawned and released only after
/// the task's final politeness delay, so at most `concurrency` fetches are in
/// flight and at most `concurrency` tasks exist at any time.
pub struct WorkerPool {
    context: Arc<ItemContext>,
    concurrency: usize,
}

impl WorkerPool {
    pub fn new(
        fetcher: Arc<dyn DetailFetcher>,
        filter: Arc<RecordFilter>,
        sink: SinkHandle,
        policy: RetryPolicy,
        concurrency: usize,
    ) -> Self {
        Self {
            context: Arc::new(ItemContext {
                fetcher,
                filter,
                sink,
                policy,
            }),
            concurrency: concurrency.max(1),
        }
    }

    pub async fn run(&self, queue: Vec<AppId>, progress: &dyn ProgressSink) -> RunSummary {
        let mut summary = RunSummary {
            queued: queue.len(),
            ..RunSummary::default()
        };
        let permits = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks = JoinSet::new();

        for app_id in queue {
            let Ok(permit) = permits.clone().acquire_owned().await else {
                break;
            };
            let context = self.context.clone();
            tasks.spawn(async move {
                let outcome = process_item(app_id, &context).await;
                drop(permit);
                (app_id, outcome)
            });

            while let Some(joined) = tasks.try_join_next() {
                collect(joined, &mut summary, progress);
            }
        }

        while let Some(joined) = tasks.join_next().await {
            collect(joined, &mut summary, progress);
        }
        summary
    }
}

fn collect(
    joined: Result<(AppId, ItemOutcome), JoinError>,
    summary: &mut RunSummary,
    progress: &dyn ProgressSink,
) {
    match joined {
        Ok((app_id, outcome)) => {
            summary.record(&outcome);
            progress.emit(EngineEvent::ItemFinished { app_id, outcome });
        }
        Err(err) => {
            engine_error!("Item task failed: {}", err);
            summary.record(&ItemOutcome::Dropped { attempts: 0 });
        }
    }
}

/// Runs the bounded retry loop for one identifier. Never fails: every error
/// ends as an `ItemOutcome`.
async fn process_item(app_id: AppId, context: &ItemContext) -> ItemOutcome {
    let policy = &context.policy;
    let mut attempt: u32 = 0;

    loop {
        let result = context.fetcher.fetch_details(app_id).await;
        if let Err(err) = &result {
            engine_debug!("App {} attempt {} failed: {}", app_id, attempt + 1, err);
        }

        let finished = match policy.classify(attempt, app_id, result, &context.filter) {
            AttemptOutcome::Success(record) => Some(match context.sink.append(record).await {
                Ok(()) => ItemOutcome::Written,
                Err(err) => {
                    engine_error!("App {} accepted but not written: {}", app_id, err);
                    ItemOutcome::WriteFailed
                }
            }),
            AttemptOutcome::FilteredOut(rejection) => Some(ItemOutcome::FilteredOut(rejection)),
            AttemptOutcome::Fatal(outcome) => Some(outcome),
            AttemptOutcome::Drop(delay) => {
                engine_warn!("App {} dropped after {} attempts", app_id, attempt + 1);
                tokio::time::sleep(delay).await;
                Some(ItemOutcome::Dropped {
                    attempts: attempt + 1,
                })
            }
            AttemptOutcome::RetryAfter(delay) => {
                engine_debug!("App {} retrying in {:?}", app_id, delay);
                tokio::time::sleep(delay).await;
                None
            }
        };

        tokio::time::sleep(policy.politeness_delay).await;

        match finished {
            Some(outcome) => return outcome,
            None => attempt += 1,
        }
    }
}
