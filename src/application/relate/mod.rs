//! Similarity ranking and materialization of `related_links`.

mod materializer;
mod ranker;

pub use materializer::{DEFAULT_LISTING_CAP, LinkMaterializer, RelateOptions, RelateSummary};
pub use ranker::{
    DEFAULT_MAX_RESULTS, DEFAULT_MIN_SCORE, RankOptions, SIMILARITY_FIELDS, SimilarityRanker,
    filter_candidates,
};
