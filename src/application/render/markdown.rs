use tracing::trace;

use crate::domain::document::{ContentItem, Document, Section};
use crate::domain::links::split_related_links;

use super::metadata::{is_chat_metadata, split_metadata_line};

/// Title of the top-level section rendered as a bare link list.
pub const TABLE_OF_CONTENTS: &str = "Table of Contents";

const RULE: &str = "---";
/// Top-level sections render as level-2 headings.
const HEADING_OFFSET: usize = 2;

/// Render `document` as Markdown, one entry per output line.
///
/// The sequence always ends with an empty entry so that joining it with `\n`
/// yields text terminated by a newline.
pub fn render(document: &Document) -> Vec<String> {
    let mut out = Lines::default();

    if let Some(title) = document.title() {
        out.line(format!("# {title}"));
        out.blank();
    }

    if !document.tags.is_empty() {
        let tags = document
            .tags
            .iter()
            .map(|tag| format!("#{tag}"))
            .collect::<Vec<_>>()
            .join(" ");
        out.line(tags);
        out.blank();
    }

    out.line(RULE);
    out.blank();
    if let Some(created) = document.metadata.created() {
        out.line(format!("created: {created}"));
    }
    if let Some(updated) = document.metadata.updated() {
        out.line(format!("updated: {updated}"));
    }
    out.blank();

    let last = document.sections.len().saturating_sub(1);
    for (position, section) in document.sections.iter().enumerate() {
        if section.title() == Some(TABLE_OF_CONTENTS) {
            render_table_of_contents(section, &mut out);
            continue;
        }
        render_section(section, 0, &mut out);
        if position < last {
            out.separator();
        }
    }

    if let Some(links) = document.related_links() {
        let links = split_related_links(links);
        if !links.is_empty() {
            out.separator();
            out.line("## Related");
            out.blank();
            for link in links {
                out.line(link);
            }
            out.blank();
        }
    }

    out.blank();
    out.into_lines()
}

/// Render `document` as a single newline-joined string.
pub fn render_text(document: &Document) -> String {
    render(document).join("\n")
}

fn render_section(section: &Section, depth: usize, out: &mut Lines) {
    if let Some(title) = section.title() {
        out.line(format!("{} {title}", "#".repeat(depth + HEADING_OFFSET)));
        out.blank();
    }

    for item in &section.content {
        render_item(item, out);
    }

    // Only top-level siblings are separated by a rule.
    for child in &section.subsections {
        render_section(child, depth + 1, out);
    }
}

fn render_item(item: &ContentItem, out: &mut Lines) {
    match item {
        ContentItem::Text {
            content,
            line_breaks,
        } => {
            if is_chat_metadata(content) {
                for line in split_metadata_line(content) {
                    out.line(line);
                }
            } else {
                out.line(content.as_str());
            }
            for _ in 0..*line_breaks {
                out.blank();
            }
        }
        ContentItem::List(items) => {
            for entry in items.iter() {
                out.line(format!("- {entry}"));
            }
            out.blank();
        }
        ContentItem::Unsupported { kind } => {
            trace!(target = "notelink::render", kind = %kind, "Skipping unsupported content item");
        }
    }
}

/// Entries are pre-formatted link lines, so they are emitted without bullets.
fn render_table_of_contents(section: &Section, out: &mut Lines) {
    out.line(format!("## {TABLE_OF_CONTENTS}"));
    out.blank();
    for item in &section.content {
        if let ContentItem::List(items) = item {
            for entry in items.iter() {
                out.line(entry);
                out.blank();
            }
        }
    }
}

#[derive(Default)]
struct Lines(Vec<String>);

impl Lines {
    fn line(&mut self, line: impl Into<String>) {
        self.0.push(line.into());
    }

    fn blank(&mut self) {
        self.0.push(String::new());
    }

    fn separator(&mut self) {
        self.line(RULE);
        self.blank();
    }

    fn into_lines(self) -> Vec<String> {
        self.0
    }
}
