use std::collections::BTreeSet;
use std::time::Duration;

use engine_logging::{engine_debug, engine_error, engine_info, engine_warn};
use harvest_core::{AppId, FilterCriteria};

use crate::fetch::{CatalogLister, ProgressSink};
use crate::{EngineEvent, FailureKind, ListingStop};

/// Walks the catalog with forward cursor pagination.
///
/// Listing failures are never retried: whatever was accumulated before the
/// failure is returned, and a later run re-lists and reconciles against the
/// checkpoint.
pub struct CatalogPaginator<'a> {
    lister: &'a dyn CatalogLister,
    criteria: &'a FilterCriteria,
    page_delay: Duration,
}

impl<'a> CatalogPaginator<'a> {
    pub fn new(
        lister: &'a dyn CatalogLister,
        criteria: &'a FilterCriteria,
        page_delay: Duration,
    ) -> Self {
        Self {
            lister,
            criteria,
            page_delay,
        }
    }

    /// Deduplicated candidates above the minimum id, newest first.
    pub async fn enumerate(&self, progress: &dyn ProgressSink) -> Vec<AppId> {
        let mut seen = BTreeSet::new();
        let mut cursor: AppId = 0;
        let mut page: u32 = 0;

        let stop = loop {
            page += 1;
            engine_debug!("Listing page {} after cursor {}", page, cursor);

            let batch = match self.lister.list_page(cursor).await {
                Ok(batch) => batch,
                Err(err) => {
                    match err.kind {
                        FailureKind::AuthRejected(_) => engine_error!(
                            "Listing rejected at page {} ({}); check the API key",
                            page,
                            err
                        ),
                        _ => engine_warn!("Listing stopped at page {}: {}", page, err),
                    }
                    break ListingStop::Failed(err.kind);
                }
            };

            let Some(page_max) = batch.app_ids.iter().copied().max() else {
                engine_info!("Listing reached an empty page after {} pages", page - 1);
                break ListingStop::EndOfCatalog;
            };

            let items = batch.app_ids.len();
            seen.extend(batch.app_ids);
            progress.emit(EngineEvent::ListingPage {
                page,
                cursor,
                items,
            });

            if page_max <= cursor {
                engine_warn!(
                    "Listing cursor did not advance past {} on page {}; stopping",
                    cursor,
                    page
                );
                break ListingStop::CursorStalled;
            }
            cursor = page_max;

            if batch.have_more_results == Some(false) {
                engine_info!("Listing reported no more results after page {}", page);
                break ListingStop::EndOfCatalog;
            }

            tokio::time::sleep(self.page_delay).await;
        };

        let total = seen.len();
        let candidates: Vec<AppId> = seen
            .into_iter()
            .rev()
            .filter(|&id| self.criteria.accepts_id(id))
            .collect();

        engine_info!(
            "Listing collected {} ids; {} above min id {}",
            total,
            candidates.len(),
            self.criteria.min_app_id
        );
        progress.emit(EngineEvent::ListingFinished {
            pages: page,
            total,
            stop,
        });
        candidates
    }
}
