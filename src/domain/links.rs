//! Cross-reference tokens stored in a document's `related_links` field.

use serde::Serialize;

const LINK_OPEN: &str = "[[";
const LINK_CLOSE: &str = "]]";

/// A candidate document and the relevance score the index assigned to it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimilarityResult {
    pub id: String,
    pub score: f64,
}

/// Render one reference as `[[id]]`.
pub fn link_token(id: &str) -> String {
    format!("{LINK_OPEN}{id}{LINK_CLOSE}")
}

/// Space-join the link tokens of `results`, keeping their order.
pub fn format_related_links(results: &[SimilarityResult]) -> String {
    results
        .iter()
        .map(|result| link_token(&result.id))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Split a stored `related_links` value back into one token per reference.
///
/// Bracketed tokens are kept whole even when the id inside contains spaces;
/// anything outside brackets is split on whitespace.
pub fn split_related_links(stored: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut rest = stored.trim_start();

    while !rest.is_empty() {
        let end = if rest.starts_with(LINK_OPEN) {
            rest.find(LINK_CLOSE)
                .map(|close| close + LINK_CLOSE.len())
                .unwrap_or(rest.len())
        } else {
            rest.find(char::is_whitespace).unwrap_or(rest.len())
        };
        let (token, tail) = rest.split_at(end);
        tokens.push(token);
        rest = tail.trim_start();
    }

    tokens
}
