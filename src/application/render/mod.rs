//! Structured note to Markdown rendering.
//!
//! Rendering is pure: the same document always yields the same lines. Decoding
//! stored sources is the only fallible step and happens before the walk.

mod markdown;
mod metadata;
mod types;

pub use markdown::{TABLE_OF_CONTENTS, render, render_text};
pub use metadata::{is_chat_metadata, split_metadata_line};
pub use types::{RenderError, decode_document};
