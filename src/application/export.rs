//! Writes every rendered document to its own Markdown file.

use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};

use metrics::counter;
use serde::Serialize;
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::application::index::StoredDocument;
use crate::application::render::{RenderError, decode_document, render_text};
use crate::domain::document::Document;

pub const DEFAULT_OUTPUT_DIR: &str = "obsidian_notes";
const FILE_EXTENSION: &str = "md";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to prepare output directory `{path}`: {source}")]
    OutputDir { path: PathBuf, source: io::Error },
    #[error("failed to write `{path}`: {source}")]
    Write { path: PathBuf, source: io::Error },
    #[error(transparent)]
    Render(#[from] RenderError),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExportSummary {
    pub written: usize,
    pub failed: Vec<String>,
}

pub struct DocumentExporter {
    output_dir: PathBuf,
}

impl DocumentExporter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Render and write each document, replacing files of the same name.
    ///
    /// Only an unusable output directory fails the export; a document that
    /// cannot be decoded or written is logged and reported in the summary.
    pub fn export_all(
        &self,
        documents: Vec<StoredDocument>,
    ) -> Result<ExportSummary, ExportError> {
        fs::create_dir_all(&self.output_dir).map_err(|source| ExportError::OutputDir {
            path: self.output_dir.clone(),
            source,
        })?;

        let mut summary = ExportSummary::default();
        for stored in documents {
            let id = stored.id.clone();
            counter!("notelink_export_documents_total").increment(1);
            match self.export_one(stored) {
                Ok(path) => {
                    summary.written += 1;
                    debug!(
                        target = "notelink::export",
                        doc_id = %id,
                        path = %path.display(),
                        "Wrote document"
                    );
                }
                Err(err) => {
                    counter!("notelink_export_failures_total").increment(1);
                    warn!(
                        target = "notelink::export",
                        doc_id = %id,
                        error = %err,
                        "Failed to export document"
                    );
                    summary.failed.push(id);
                }
            }
        }

        info!(
            target = "notelink::export",
            written = summary.written,
            failed = summary.failed.len(),
            output_dir = %self.output_dir.display(),
            "Export completed"
        );
        Ok(summary)
    }

    fn export_one(&self, stored: StoredDocument) -> Result<PathBuf, ExportError> {
        let document = decode_document(stored)?;
        self.write_document(&document)
    }

    /// Write through a temporary file in the same directory so readers never
    /// observe a partially written note.
    fn write_document(&self, document: &Document) -> Result<PathBuf, ExportError> {
        let path = self.output_dir.join(safe_file_name(&document.id));
        let write_error = |source| ExportError::Write {
            path: path.clone(),
            source,
        };

        let mut file = NamedTempFile::new_in(&self.output_dir).map_err(write_error)?;
        file.write_all(render_text(document).as_bytes())
            .map_err(write_error)?;
        file.persist(&path).map_err(|err| write_error(err.error))?;
        Ok(path)
    }
}

/// File name for a document id, with path separators replaced by `_`.
pub fn safe_file_name(id: &str) -> String {
    format!("{}.{FILE_EXTENSION}", id.replace(['/', '\\'], "_"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn separators_become_underscores() {
        assert_eq!(safe_file_name("notes/2024\\jan"), "notes_2024_jan.md");
        assert_eq!(safe_file_name("plain"), "plain.md");
    }
}
