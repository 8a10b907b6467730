use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueHint, builder::BoolishValueParser};

/// Command-line arguments for the notelink binary.
#[derive(Debug, Parser)]
#[command(
    name = "notelink",
    version,
    about = "Cross-link and export notes stored in a search index"
)]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "NOTELINK_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Compute related documents for every note and store them as links.
    Relate(RelateArgs),
    /// Print the documents most similar to one note.
    Similar(SimilarArgs),
    /// Render every note to a Markdown file.
    Export(ExportArgs),
}

impl Command {
    pub fn index(&self) -> &IndexOverrides {
        match self {
            Command::Relate(args) => &args.index,
            Command::Similar(args) => &args.index,
            Command::Export(args) => &args.index,
        }
    }

    pub fn logging(&self) -> &LoggingOverrides {
        match self {
            Command::Relate(args) => &args.logging,
            Command::Similar(args) => &args.logging,
            Command::Export(args) => &args.logging,
        }
    }
}

#[derive(Debug, Args, Default, Clone)]
pub struct RelateArgs {
    #[command(flatten)]
    pub index: IndexOverrides,

    #[command(flatten)]
    pub logging: LoggingOverrides,

    #[command(flatten)]
    pub ranking: RankingOverrides,

    /// Override the maximum number of documents a single listing may return.
    #[arg(long = "listing-cap", value_name = "COUNT")]
    pub listing_cap: Option<u64>,

    /// Override the number of documents related at once.
    #[arg(long = "concurrency", value_name = "COUNT")]
    pub concurrency: Option<u64>,
}

#[derive(Debug, Args, Clone)]
pub struct SimilarArgs {
    #[command(flatten)]
    pub index: IndexOverrides,

    #[command(flatten)]
    pub logging: LoggingOverrides,

    #[command(flatten)]
    pub ranking: RankingOverrides,

    /// Id of the seed document.
    #[arg(value_name = "ID")]
    pub id: String,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ExportArgs {
    #[command(flatten)]
    pub index: IndexOverrides,

    #[command(flatten)]
    pub logging: LoggingOverrides,

    /// Override the maximum number of documents a single listing may return.
    #[arg(long = "listing-cap", value_name = "COUNT")]
    pub listing_cap: Option<u64>,

    /// Override the directory Markdown files are written to.
    #[arg(long = "output-dir", value_name = "PATH", value_hint = ValueHint::DirPath)]
    pub output_dir: Option<PathBuf>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct IndexOverrides {
    /// Override the search service base URL.
    #[arg(long = "index-url", value_name = "URL")]
    pub base_url: Option<String>,

    /// Override the index name.
    #[arg(long = "index-name", value_name = "NAME")]
    pub index_name: Option<String>,

    /// Override the basic-auth user name (the password is read from config or env only).
    #[arg(long = "index-username", value_name = "USER")]
    pub username: Option<String>,

    /// Skip TLS certificate verification, e.g. for self-signed local clusters.
    #[arg(long = "insecure", action = clap::ArgAction::SetTrue)]
    pub insecure: bool,

    /// Override the per-request timeout.
    #[arg(long = "request-timeout-seconds", value_name = "SECONDS")]
    pub request_timeout_seconds: Option<u64>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct LoggingOverrides {
    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: Option<bool>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct RankingOverrides {
    /// Override the minimum relevance score a related document must reach.
    #[arg(long = "min-score", value_name = "SCORE")]
    pub min_score: Option<f64>,

    /// Override the maximum number of related documents per note.
    #[arg(long = "max-results", value_name = "COUNT")]
    pub max_results: Option<u64>,
}
