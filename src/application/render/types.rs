use thiserror::Error;

use crate::application::index::StoredDocument;
use crate::domain::document::Document;

/// Failures that keep a stored document from being rendered.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("document `{id}` could not be decoded: {source}")]
    MalformedSource {
        id: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Decode a listed document into the typed model the renderer walks.
pub fn decode_document(stored: StoredDocument) -> Result<Document, RenderError> {
    let StoredDocument { id, source } = stored;
    Document::from_source(id.clone(), source)
        .map_err(|source| RenderError::MalformedSource { id, source })
}
