use std::{num::NonZeroUsize, sync::Arc};

use futures::stream::{self, StreamExt};
use metrics::{counter, histogram};
use serde::Serialize;
use tracing::{debug, error, info};

use crate::application::index::{IndexError, SearchIndex};
use crate::domain::links::format_related_links;

use super::ranker::{RankOptions, SimilarityRanker};

/// Upper bound on documents enumerated by a single listing call.
pub const DEFAULT_LISTING_CAP: usize = 10_000;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RelateOptions {
    pub rank: RankOptions,
    pub listing_cap: NonZeroUsize,
    /// Documents processed at once; `1` processes strictly one after another.
    pub concurrency: NonZeroUsize,
}

impl Default for RelateOptions {
    fn default() -> Self {
        Self {
            rank: RankOptions::default(),
            listing_cap: NonZeroUsize::new(DEFAULT_LISTING_CAP).unwrap_or(NonZeroUsize::MIN),
            concurrency: NonZeroUsize::MIN,
        }
    }
}

/// Outcome of one materializer run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RelateSummary {
    pub processed: usize,
    pub updated: usize,
    pub failed: Vec<String>,
}

/// Writes each document's related links back into the index.
pub struct LinkMaterializer {
    index: Arc<dyn SearchIndex>,
    ranker: SimilarityRanker,
    options: RelateOptions,
}

impl LinkMaterializer {
    pub fn new(index: Arc<dyn SearchIndex>, options: RelateOptions) -> Self {
        Self {
            ranker: SimilarityRanker::new(index.clone()),
            index,
            options,
        }
    }

    /// Rank and update every listed document.
    ///
    /// Only a failed listing aborts the run; a document that fails to rank or
    /// update is logged and counted, and the run moves on.
    pub async fn run(&self) -> Result<RelateSummary, IndexError> {
        let ids = self
            .index
            .list_document_ids(self.options.listing_cap.get())
            .await?;
        info!(
            target = "notelink::relate",
            documents = ids.len(),
            concurrency = self.options.concurrency.get(),
            "Starting relate"
        );

        let summary = stream::iter(ids)
            .map(|doc_id| async move {
                let outcome = self.relate_one(&doc_id).await;
                (doc_id, outcome)
            })
            .buffered(self.options.concurrency.get())
            .fold(RelateSummary::default(), |mut summary, (doc_id, outcome)| async move {
                summary.processed += 1;
                counter!("notelink_relate_documents_total").increment(1);
                match outcome {
                    Ok(count) => {
                        summary.updated += 1;
                        debug!(
                            target = "notelink::relate",
                            doc_id = %doc_id,
                            related = count,
                            "Updated related links"
                        );
                    }
                    Err(err) => {
                        counter!("notelink_relate_failures_total").increment(1);
                        error!(
                            target = "notelink::relate",
                            doc_id = %doc_id,
                            error = %err,
                            "Failed to relate document"
                        );
                        summary.failed.push(doc_id);
                    }
                }
                summary
            })
            .await;

        info!(
            target = "notelink::relate",
            processed = summary.processed,
            updated = summary.updated,
            failed = summary.failed.len(),
            "Relate completed"
        );
        Ok(summary)
    }

    async fn relate_one(&self, doc_id: &str) -> Result<usize, IndexError> {
        let results = self.ranker.rank(doc_id, self.options.rank).await?;
        histogram!("notelink_related_links_count").record(results.len() as f64);
        let links = format_related_links(&results);
        self.index.update_related_links(doc_id, &links).await?;
        Ok(results.len())
    }
}
