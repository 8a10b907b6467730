//! Wire shapes exchanged with an Elasticsearch-compatible search index.
//!
//! Only the subset of the query DSL notelink actually issues is modelled here:
//! a `match_all` listing, a `more_like_this` similarity query and a partial
//! document update.

use serde::{Deserialize, Serialize};

/// Body of a `_search` request enumerating every document in the index.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListingRequest {
    pub size: usize,
    #[serde(rename = "_source")]
    pub source: bool,
    pub track_total_hits: bool,
    pub query: ListingQuery,
}

impl ListingRequest {
    /// Listing of ids only; the document bodies are not transferred.
    pub fn ids(size: usize) -> Self {
        Self {
            size,
            source: false,
            track_total_hits: true,
            query: ListingQuery::default(),
        }
    }

    /// Listing that carries each document's `_source`.
    pub fn documents(size: usize) -> Self {
        Self {
            source: true,
            ..Self::ids(size)
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ListingQuery {
    pub match_all: MatchAll,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MatchAll {}

/// Body of a `_search` request running a `more_like_this` query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimilarityRequest {
    pub size: usize,
    pub query: SimilarityQuery,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimilarityQuery {
    pub more_like_this: MoreLikeThis,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MoreLikeThis {
    /// Field names with optional `^boost` suffixes.
    pub fields: Vec<String>,
    pub like: Vec<LikeDocument>,
    pub min_term_freq: u32,
    pub min_doc_freq: u32,
}

/// Reference to an indexed document used as the similarity seed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LikeDocument {
    #[serde(rename = "_index")]
    pub index: String,
    #[serde(rename = "_id")]
    pub id: String,
}

/// Response of any `_search` request.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse<S = serde_json::Value> {
    pub hits: HitsEnvelope<S>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HitsEnvelope<S = serde_json::Value> {
    #[serde(default)]
    pub total: Option<TotalHits>,
    pub hits: Vec<Hit<S>>,
}

/// Total hit count; newer servers report an object, older ones a bare number.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum TotalHits {
    Object { value: u64 },
    Count(u64),
}

impl TotalHits {
    pub fn value(self) -> u64 {
        match self {
            TotalHits::Object { value } | TotalHits::Count(value) => value,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Hit<S = serde_json::Value> {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_score", default)]
    pub score: Option<f64>,
    #[serde(rename = "_source")]
    pub source: Option<S>,
}

/// Body of an `_update` request applying a partial document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpdateRequest<T> {
    pub doc: T,
}

/// Partial document written back by the link materializer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelatedLinksPatch {
    pub related_links: String,
}

/// Acknowledgement returned by `_update`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateResponse {
    #[serde(default)]
    pub result: Option<String>,
    #[serde(rename = "_version", default)]
    pub version: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn listing_request_omits_sources_for_ids() {
        let body = serde_json::to_value(ListingRequest::ids(10_000)).expect("encode");
        assert_eq!(
            body,
            json!({
                "size": 10000,
                "_source": false,
                "track_total_hits": true,
                "query": { "match_all": {} }
            })
        );
    }

    #[test]
    fn total_hits_accepts_both_shapes() {
        let object: TotalHits =
            serde_json::from_value(json!({"value": 7, "relation": "eq"})).expect("object");
        let count: TotalHits = serde_json::from_value(json!(7)).expect("count");
        assert_eq!(object.value(), 7);
        assert_eq!(count.value(), 7);
    }

    #[derive(Debug, Deserialize)]
    struct TitleOnly {
        title: String,
    }

    #[test]
    fn hit_decodes_into_typed_source_without_default() {
        let hit: Hit<TitleOnly> =
            serde_json::from_value(json!({"_id": "a", "_score": 1.5, "_source": {"title": "T"}}))
                .expect("hit");
        assert_eq!(hit.source.map(|source| source.title).as_deref(), Some("T"));

        let bare: Hit<TitleOnly> = serde_json::from_value(json!({"_id": "b"})).expect("hit");
        assert!(bare.source.is_none());
    }

    #[test]
    fn hit_without_score_or_source_decodes() {
        let hit: Hit = serde_json::from_value(json!({"_id": "a"})).expect("hit");
        assert_eq!(hit.id, "a");
        assert!(hit.score.is_none());
        assert!(hit.source.is_none());
    }
}
