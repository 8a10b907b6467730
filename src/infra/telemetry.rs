use std::sync::Once;

use metrics::{Unit, describe_counter, describe_histogram};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::config::{LogFormat, LoggingSettings};

use super::error::InfraError;

static METRIC_DESCRIPTIONS: Once = Once::new();

/// Install a global tracing subscriber using the provided logging settings.
pub fn init(logging: &LoggingSettings) -> Result<(), InfraError> {
    describe_metrics();

    let env_filter = EnvFilter::builder()
        .with_default_directive(logging.level.into())
        .from_env_lossy();

    let fmt_layer = match logging.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .with_writer(std::io::stderr)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .compact()
            .with_target(true)
            .with_writer(std::io::stderr)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(ErrorLayer::default())
        .with(fmt_layer)
        .try_init()
        .map_err(|err| {
            InfraError::telemetry(format!("failed to install tracing subscriber: {err}"))
        })
}

fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(
            "notelink_relate_documents_total",
            Unit::Count,
            "Total number of documents the link materializer attempted."
        );
        describe_counter!(
            "notelink_relate_failures_total",
            Unit::Count,
            "Total number of documents whose related links could not be written."
        );
        describe_histogram!(
            "notelink_related_links_count",
            Unit::Count,
            "Number of related links written per document."
        );
        describe_counter!(
            "notelink_export_documents_total",
            Unit::Count,
            "Total number of documents the exporter attempted."
        );
        describe_counter!(
            "notelink_export_failures_total",
            Unit::Count,
            "Total number of documents that could not be exported."
        );
        describe_counter!(
            "notelink_index_retries_total",
            Unit::Count,
            "Total number of search service requests retried after a transient failure."
        );
    });
}
