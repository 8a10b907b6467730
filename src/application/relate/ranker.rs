use std::{num::NonZeroUsize, sync::Arc};

use tracing::debug;

use crate::application::index::{FieldWeight, IndexError, SearchIndex, SimilarityQuery};
use crate::domain::links::SimilarityResult;

pub const DEFAULT_MIN_SCORE: f64 = 0.1;
pub const DEFAULT_MAX_RESULTS: usize = 10;

/// Fields the similarity query reads, weighted so that shared tags count most.
pub const SIMILARITY_FIELDS: [FieldWeight; 4] = [
    FieldWeight::new("title", 2),
    FieldWeight::new("tags", 3),
    FieldWeight::new("sections", 1),
    FieldWeight::new("plain_text", 1),
];

/// No frequency floor beyond the term being present at all.
const MIN_TERM_FREQ: u32 = 1;
const MIN_DOC_FREQ: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankOptions {
    pub min_score: f64,
    pub max_results: NonZeroUsize,
}

impl Default for RankOptions {
    fn default() -> Self {
        Self {
            min_score: DEFAULT_MIN_SCORE,
            max_results: NonZeroUsize::new(DEFAULT_MAX_RESULTS).unwrap_or(NonZeroUsize::MIN),
        }
    }
}

/// Ranks the documents most similar to a seed document.
#[derive(Clone)]
pub struct SimilarityRanker {
    index: Arc<dyn SearchIndex>,
}

impl SimilarityRanker {
    pub fn new(index: Arc<dyn SearchIndex>) -> Self {
        Self { index }
    }

    /// Related documents for `doc_id`, highest relevance first.
    ///
    /// The result never contains `doc_id` itself, never holds a score below
    /// `options.min_score`, and is at most `options.max_results` long. Any
    /// service failure fails the whole ranking.
    pub async fn rank(
        &self,
        doc_id: &str,
        options: RankOptions,
    ) -> Result<Vec<SimilarityResult>, IndexError> {
        let candidates = self
            .index
            .find_similar(SimilarityQuery {
                seed_id: doc_id,
                fields: &SIMILARITY_FIELDS,
                min_term_freq: MIN_TERM_FREQ,
                min_doc_freq: MIN_DOC_FREQ,
                max_results: options.max_results.get(),
            })
            .await?;

        let results = filter_candidates(doc_id, candidates, options);
        for (rank, result) in results.iter().enumerate() {
            debug!(
                target = "notelink::relate",
                doc_id,
                rank = rank + 1,
                similar_id = %result.id,
                score = format_args!("{:.3}", result.score),
                "Ranked similar document"
            );
        }
        Ok(results)
    }
}

/// Drop the seed and low-scoring candidates without reordering the rest.
pub fn filter_candidates(
    seed_id: &str,
    candidates: Vec<SimilarityResult>,
    options: RankOptions,
) -> Vec<SimilarityResult> {
    candidates
        .into_iter()
        .filter(|candidate| candidate.id != seed_id && candidate.score >= options.min_score)
        .take(options.max_results.get())
        .collect()
}
