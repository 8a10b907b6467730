//! The search index as seen by the application layer.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::links::SimilarityResult;

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("search service unavailable: {message}")]
    Unavailable { message: String },
    #[error("search service rejected the request: {message}")]
    Service { message: String },
    #[error("malformed search service response: {message}")]
    MalformedResponse { message: String },
    #[error("document `{id}` not found")]
    NotFound { id: String },
    #[error("index holds {total} documents, more than the listing cap of {cap}")]
    CorpusTooLarge { total: u64, cap: usize },
}

impl IndexError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    pub fn service(message: impl Into<String>) -> Self {
        Self::Service {
            message: message.into(),
        }
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedResponse {
            message: message.into(),
        }
    }

    /// Whether repeating the same request may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, IndexError::Unavailable { .. })
    }
}

/// A field consulted by the similarity query and its relative weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldWeight {
    pub field: &'static str,
    pub boost: u32,
}

impl FieldWeight {
    pub const fn new(field: &'static str, boost: u32) -> Self {
        Self { field, boost }
    }

    /// Field reference in query-DSL form, e.g. `title^2`.
    pub fn clause(&self) -> String {
        if self.boost == 1 {
            self.field.to_string()
        } else {
            format!("{}^{}", self.field, self.boost)
        }
    }
}

/// Parameters of a find-similar query seeded by an indexed document.
#[derive(Debug, Clone, Copy)]
pub struct SimilarityQuery<'a> {
    pub seed_id: &'a str,
    pub fields: &'a [FieldWeight],
    pub min_term_freq: u32,
    pub min_doc_freq: u32,
    pub max_results: usize,
}

/// A document as returned by a full listing: id plus raw stored source.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub id: String,
    pub source: serde_json::Value,
}

#[async_trait]
pub trait SearchIndex: Send + Sync {
    /// Every document id, in listing order. Fails rather than truncating when
    /// the index holds more than `cap` documents.
    async fn list_document_ids(&self, cap: usize) -> Result<Vec<String>, IndexError>;

    /// Every document with its stored source, under the same cap rule.
    async fn list_documents(&self, cap: usize) -> Result<Vec<StoredDocument>, IndexError>;

    /// Candidates ranked by the service, highest score first.
    async fn find_similar(
        &self,
        query: SimilarityQuery<'_>,
    ) -> Result<Vec<SimilarityResult>, IndexError>;

    /// Overwrite the `related_links` field of `id`.
    async fn update_related_links(&self, id: &str, links: &str) -> Result<(), IndexError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_boost_is_left_implicit() {
        assert_eq!(FieldWeight::new("sections", 1).clause(), "sections");
        assert_eq!(FieldWeight::new("tags", 3).clause(), "tags^3");
    }

    #[test]
    fn only_unavailable_is_transient() {
        assert!(IndexError::unavailable("timeout").is_transient());
        assert!(!IndexError::service("status 400").is_transient());
        assert!(!IndexError::NotFound { id: "a".into() }.is_transient());
    }
}
