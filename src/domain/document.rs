//! Typed model of a note as stored in the search index.
//!
//! Stored sources are loosely structured JSON. Decoding happens once, here, so
//! that every content item is mapped onto a known variant (or explicitly
//! marked unsupported) before anything downstream looks at it.

use serde::{Deserialize, Deserializer};
use thiserror::Error;

/// A note stored in the index, identified by its index-assigned id.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Document {
    #[serde(skip)]
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub sections: Vec<Section>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub metadata: Metadata,
    #[serde(default)]
    pub related_links: Option<String>,
}

impl Document {
    /// Decode a stored `_source` object into a document carrying `id`.
    pub fn from_source(
        id: impl Into<String>,
        source: serde_json::Value,
    ) -> Result<Self, serde_json::Error> {
        let mut document: Document = serde_json::from_value(source)?;
        document.id = id.into();
        Ok(document)
    }

    pub fn title(&self) -> Option<&str> {
        non_empty(self.title.as_deref())
    }

    pub fn related_links(&self) -> Option<&str> {
        non_empty(self.related_links.as_deref())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Metadata {
    #[serde(default)]
    pub created: Option<String>,
    #[serde(default)]
    pub updated: Option<String>,
}

impl Metadata {
    pub fn created(&self) -> Option<&str> {
        non_empty(self.created.as_deref())
    }

    pub fn updated(&self) -> Option<&str> {
        non_empty(self.updated.as_deref())
    }
}

/// A titled block of content with nested subsections.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Section {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub content: Vec<ContentItem>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub subsections: Vec<Section>,
}

impl Section {
    pub fn title(&self) -> Option<&str> {
        non_empty(self.title.as_deref())
    }
}

/// One unit of section content.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawContentItem")]
pub enum ContentItem {
    /// A paragraph followed by `line_breaks` blank lines.
    Text { content: String, line_breaks: u32 },
    List(ListItems),
    /// An item whose `type` this version does not know how to render.
    Unsupported { kind: String },
}

/// The two accepted shapes of a list item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListItems {
    Entries(Vec<String>),
    Single(String),
}

impl ListItems {
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        let entries: &[String] = match self {
            ListItems::Entries(entries) => entries,
            ListItems::Single(text) => std::slice::from_ref(text),
        };
        entries.iter().map(String::as_str)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ContentItemError {
    #[error("text item has no string `content`")]
    TextWithoutContent,
    #[error("list item carries neither `content` nor `text`")]
    ListWithoutEntries,
    #[error("list item `content` must be an array of strings")]
    InvalidListEntries,
}

#[derive(Debug, Deserialize)]
struct RawContentItem {
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    content: Option<serde_json::Value>,
    #[serde(default)]
    text: Option<String>,
    #[serde(rename = "lineBreaks", default)]
    line_breaks: Option<u32>,
}

impl TryFrom<RawContentItem> for ContentItem {
    type Error = ContentItemError;

    fn try_from(raw: RawContentItem) -> Result<Self, Self::Error> {
        let content = raw.content.filter(|value| !value.is_null());
        match raw.kind.as_deref() {
            Some("text") => match content {
                Some(serde_json::Value::String(content)) => Ok(ContentItem::Text {
                    content,
                    line_breaks: raw.line_breaks.unwrap_or(0),
                }),
                _ => Err(ContentItemError::TextWithoutContent),
            },
            Some("list") => match (content, raw.text) {
                (Some(serde_json::Value::Array(values)), _) => values
                    .into_iter()
                    .map(|value| match value {
                        serde_json::Value::String(entry) => Ok(entry),
                        _ => Err(ContentItemError::InvalidListEntries),
                    })
                    .collect::<Result<Vec<_>, _>>()
                    .map(|entries| ContentItem::List(ListItems::Entries(entries))),
                (Some(_), _) => Err(ContentItemError::InvalidListEntries),
                (None, Some(text)) => Ok(ContentItem::List(ListItems::Single(text))),
                (None, None) => Err(ContentItemError::ListWithoutEntries),
            },
            other => Ok(ContentItem::Unsupported {
                kind: other.unwrap_or_default().to_string(),
            }),
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|value| !value.is_empty())
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}
