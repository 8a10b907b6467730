use std::{process, sync::Arc};

use notelink::{
    application::{
        error::AppError,
        export::DocumentExporter,
        index::SearchIndex,
        relate::{LinkMaterializer, SimilarityRanker},
    },
    config,
    infra::{search::ElasticsearchClient, telemetry},
};
use serde::Serialize;
use tracing::{Dispatch, Level, dispatcher, error, info};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt()
        .with_max_level(Level::ERROR)
        .with_writer(std::io::stderr)
        .finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    let index = init_index(&settings)?;
    match cli_args.command {
        config::Command::Relate(_) => run_relate(settings, index).await,
        config::Command::Similar(args) => run_similar(settings, index, args).await,
        config::Command::Export(_) => run_export(settings, index).await,
    }
}

fn init_index(settings: &config::Settings) -> Result<Arc<dyn SearchIndex>, AppError> {
    let client = ElasticsearchClient::new(&settings.index, &settings.retry)?;
    info!(
        target = "notelink::index",
        base_url = %settings.index.base_url,
        index = client.index_name(),
        verify_certificates = settings.index.verify_certificates,
        "Search client ready"
    );
    Ok(Arc::new(client))
}

async fn run_relate(
    settings: config::Settings,
    index: Arc<dyn SearchIndex>,
) -> Result<(), AppError> {
    let materializer = LinkMaterializer::new(index, settings.relate.options());
    let summary = materializer.run().await?;
    print_json(&summary)
}

async fn run_similar(
    settings: config::Settings,
    index: Arc<dyn SearchIndex>,
    args: config::SimilarArgs,
) -> Result<(), AppError> {
    let id = args.id.trim();
    if id.is_empty() {
        return Err(AppError::validation("document id must not be empty"));
    }

    let ranker = SimilarityRanker::new(index);
    let results = ranker.rank(id, settings.relate.rank_options()).await?;
    print_json(&results)
}

async fn run_export(
    settings: config::Settings,
    index: Arc<dyn SearchIndex>,
) -> Result<(), AppError> {
    let documents = index
        .list_documents(settings.relate.listing_cap.get())
        .await?;
    info!(
        target = "notelink::export",
        documents = documents.len(),
        output_dir = %settings.export.output_dir.display(),
        "Starting export"
    );

    let exporter = DocumentExporter::new(settings.export.output_dir);
    let summary = tokio::task::spawn_blocking(move || exporter.export_all(documents))
        .await
        .map_err(|err| AppError::unexpected(format!("export task failed: {err}")))??;
    print_json(&summary)
}

fn print_json<T: Serialize>(value: &T) -> Result<(), AppError> {
    let out = serde_json::to_string_pretty(value)
        .map_err(|err| AppError::unexpected(format!("failed to render output: {err}")))?;
    println!("{out}");
    Ok(())
}
