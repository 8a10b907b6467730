use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use metrics_util::debugging::DebuggingRecorder;
use notelink::application::{
    export::DocumentExporter,
    index::{IndexError, SearchIndex, SimilarityQuery, StoredDocument},
    relate::{LinkMaterializer, RelateOptions},
};
use notelink::domain::links::SimilarityResult;
use serde_json::json;
use tempfile::TempDir;

/// Two documents; relating `b` always fails.
struct TwoNotes;

#[async_trait]
impl SearchIndex for TwoNotes {
    async fn list_document_ids(&self, _cap: usize) -> Result<Vec<String>, IndexError> {
        Ok(vec!["a".to_string(), "b".to_string()])
    }

    async fn list_documents(&self, _cap: usize) -> Result<Vec<StoredDocument>, IndexError> {
        Ok(Vec::new())
    }

    async fn find_similar(
        &self,
        query: SimilarityQuery<'_>,
    ) -> Result<Vec<SimilarityResult>, IndexError> {
        match query.seed_id {
            "a" => Ok(vec![SimilarityResult {
                id: "b".to_string(),
                score: 0.9,
            }]),
            _ => Err(IndexError::unavailable("connection reset")),
        }
    }

    async fn update_related_links(&self, _id: &str, _links: &str) -> Result<(), IndexError> {
        Ok(())
    }
}

#[tokio::test]
async fn relate_and_export_emit_expected_metric_keys() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    recorder
        .install()
        .expect("debug metrics recorder should install in this test process");

    let materializer = LinkMaterializer::new(Arc::new(TwoNotes), RelateOptions::default());
    let summary = materializer.run().await.expect("relate run");
    assert_eq!(summary.updated, 1);
    assert_eq!(summary.failed, vec!["b".to_string()]);

    let dir = TempDir::new().expect("tmp dir");
    let exporter = DocumentExporter::new(dir.path());
    exporter
        .export_all(vec![
            StoredDocument {
                id: "ok".to_string(),
                source: json!({"title": "Ok"}),
            },
            StoredDocument {
                id: "bad".to_string(),
                source: json!({"tags": "not-a-list"}),
            },
        ])
        .expect("export");

    let names: HashSet<String> = snapshotter
        .snapshot()
        .into_vec()
        .into_iter()
        .map(|(composite_key, _, _, _)| composite_key.key().name().to_string())
        .collect();

    let expected = [
        "notelink_relate_documents_total",
        "notelink_relate_failures_total",
        "notelink_related_links_count",
        "notelink_export_documents_total",
        "notelink_export_failures_total",
    ];

    for metric in expected {
        assert!(names.contains(metric), "missing metric: {metric}");
    }
}
