//! Configuration layer: typed settings with layered precedence (file → env → CLI).

mod cli;

use std::{
    fmt,
    num::{NonZeroU32, NonZeroUsize},
    path::PathBuf,
    str::FromStr,
    time::Duration,
};

use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;
use url::Url;

use crate::application::{
    export::DEFAULT_OUTPUT_DIR,
    relate::{DEFAULT_LISTING_CAP, DEFAULT_MAX_RESULTS, DEFAULT_MIN_SCORE, RankOptions, RelateOptions},
};

pub use cli::{
    CliArgs, Command, ExportArgs, IndexOverrides, LoggingOverrides, RankingOverrides, RelateArgs,
    SimilarArgs,
};

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "notelink";
const ENV_PREFIX: &str = "NOTELINK";
const DEFAULT_BASE_URL: &str = "https://localhost:9200";
const DEFAULT_INDEX_NAME: &str = "obsidian_notes";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
const DEFAULT_RETRY_MAX_ATTEMPTS: u64 = 3;
const DEFAULT_RETRY_INITIAL_BACKOFF_MS: u64 = 200;
const DEFAULT_RELATE_CONCURRENCY: u64 = 1;

/// Fully-resolved settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub index: IndexSettings,
    pub retry: RetrySettings,
    pub relate: RelateSettings,
    pub export: ExportSettings,
    pub logging: LoggingSettings,
}

/// Connection settings handed to the search client.
#[derive(Clone)]
pub struct IndexSettings {
    pub base_url: Url,
    pub index_name: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub verify_certificates: bool,
    pub request_timeout: Duration,
}

impl fmt::Debug for IndexSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IndexSettings")
            .field("base_url", &self.base_url.as_str())
            .field("index_name", &self.index_name)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("verify_certificates", &self.verify_certificates)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct RetrySettings {
    pub max_attempts: NonZeroU32,
    pub initial_backoff: Duration,
}

impl RetrySettings {
    /// Delay before retry number `attempt` (1-based), doubling each time.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 1u32 << attempt.saturating_sub(1).min(16);
        self.initial_backoff.saturating_mul(factor)
    }
}

#[derive(Debug, Clone)]
pub struct RelateSettings {
    pub min_score: f64,
    pub max_results: NonZeroUsize,
    pub listing_cap: NonZeroUsize,
    pub concurrency: NonZeroUsize,
}

impl RelateSettings {
    pub fn rank_options(&self) -> RankOptions {
        RankOptions {
            min_score: self.min_score,
            max_results: self.max_results,
        }
    }

    pub fn options(&self) -> RelateOptions {
        RelateOptions {
            rank: self.rank_options(),
            listing_cap: self.listing_cap,
            concurrency: self.concurrency,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExportSettings {
    pub output_dir: PathBuf,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix(ENV_PREFIX).separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;
    raw.apply_command_overrides(&cli.command);
    Settings::from_raw(raw)
}

/// Resolve configuration using the process arguments, returning both for downstream use.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    index: RawIndexSettings,
    retry: RawRetrySettings,
    relate: RawRelateSettings,
    export: RawExportSettings,
    logging: RawLoggingSettings,
}

impl RawSettings {
    fn apply_command_overrides(&mut self, command: &Command) {
        self.apply_index_overrides(command.index());
        self.apply_logging_overrides(command.logging());

        match command {
            Command::Relate(args) => {
                self.apply_ranking_overrides(&args.ranking);
                if let Some(cap) = args.listing_cap {
                    self.relate.listing_cap = Some(cap);
                }
                if let Some(concurrency) = args.concurrency {
                    self.relate.concurrency = Some(concurrency);
                }
            }
            Command::Similar(args) => self.apply_ranking_overrides(&args.ranking),
            Command::Export(args) => {
                if let Some(cap) = args.listing_cap {
                    self.relate.listing_cap = Some(cap);
                }
                if let Some(dir) = args.output_dir.as_ref() {
                    self.export.output_dir = Some(dir.clone());
                }
            }
        }
    }

    fn apply_index_overrides(&mut self, overrides: &IndexOverrides) {
        if let Some(url) = overrides.base_url.as_ref() {
            self.index.base_url = Some(url.clone());
        }
        if let Some(name) = overrides.index_name.as_ref() {
            self.index.index_name = Some(name.clone());
        }
        if let Some(username) = overrides.username.as_ref() {
            self.index.username = Some(username.clone());
        }
        if overrides.insecure {
            self.index.verify_certificates = Some(false);
        }
        if let Some(seconds) = overrides.request_timeout_seconds {
            self.index.request_timeout_seconds = Some(seconds);
        }
    }

    fn apply_logging_overrides(&mut self, overrides: &LoggingOverrides) {
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
    }

    fn apply_ranking_overrides(&mut self, overrides: &RankingOverrides) {
        if let Some(min_score) = overrides.min_score {
            self.relate.min_score = Some(min_score);
        }
        if let Some(max_results) = overrides.max_results {
            self.relate.max_results = Some(max_results);
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            index,
            retry,
            relate,
            export,
            logging,
        } = raw;

        Ok(Self {
            index: build_index_settings(index)?,
            retry: build_retry_settings(retry)?,
            relate: build_relate_settings(relate)?,
            export: build_export_settings(export)?,
            logging: build_logging_settings(logging)?,
        })
    }
}

fn build_index_settings(index: RawIndexSettings) -> Result<IndexSettings, LoadError> {
    let base_url = index
        .base_url
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
    let base_url = Url::parse(base_url.trim())
        .map_err(|err| LoadError::invalid("index.base_url", format!("failed to parse: {err}")))?;
    if !matches!(base_url.scheme(), "http" | "https") {
        return Err(LoadError::invalid(
            "index.base_url",
            "scheme must be http or https",
        ));
    }

    let index_name = index
        .index_name
        .map(|name| name.trim().to_string())
        .unwrap_or_else(|| DEFAULT_INDEX_NAME.to_string());
    if index_name.is_empty() {
        return Err(LoadError::invalid("index.index_name", "must not be empty"));
    }

    let username = index.username.and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    });

    let timeout_secs = index
        .request_timeout_seconds
        .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS);
    if timeout_secs == 0 {
        return Err(LoadError::invalid(
            "index.request_timeout_seconds",
            "must be greater than zero",
        ));
    }

    Ok(IndexSettings {
        base_url,
        index_name,
        username,
        password: index.password,
        verify_certificates: index.verify_certificates.unwrap_or(true),
        request_timeout: Duration::from_secs(timeout_secs),
    })
}

fn build_retry_settings(retry: RawRetrySettings) -> Result<RetrySettings, LoadError> {
    let max_attempts = retry.max_attempts.unwrap_or(DEFAULT_RETRY_MAX_ATTEMPTS);
    Ok(RetrySettings {
        max_attempts: non_zero_u32(max_attempts, "retry.max_attempts")?,
        initial_backoff: Duration::from_millis(
            retry
                .initial_backoff_ms
                .unwrap_or(DEFAULT_RETRY_INITIAL_BACKOFF_MS),
        ),
    })
}

fn build_relate_settings(relate: RawRelateSettings) -> Result<RelateSettings, LoadError> {
    let min_score = relate.min_score.unwrap_or(DEFAULT_MIN_SCORE);
    if !min_score.is_finite() || min_score < 0.0 {
        return Err(LoadError::invalid(
            "relate.min_score",
            "must be a finite, non-negative number",
        ));
    }

    let max_results = relate.max_results.unwrap_or(DEFAULT_MAX_RESULTS as u64);
    let listing_cap = relate.listing_cap.unwrap_or(DEFAULT_LISTING_CAP as u64);
    let concurrency = relate.concurrency.unwrap_or(DEFAULT_RELATE_CONCURRENCY);

    Ok(RelateSettings {
        min_score,
        max_results: non_zero_usize(max_results, "relate.max_results")?,
        listing_cap: non_zero_usize(listing_cap, "relate.listing_cap")?,
        concurrency: non_zero_usize(concurrency, "relate.concurrency")?,
    })
}

fn build_export_settings(export: RawExportSettings) -> Result<ExportSettings, LoadError> {
    let output_dir = export
        .output_dir
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR));
    if output_dir.as_os_str().is_empty() {
        return Err(LoadError::invalid(
            "export.output_dir",
            "path must not be empty",
        ));
    }
    Ok(ExportSettings { output_dir })
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawIndexSettings {
    base_url: Option<String>,
    index_name: Option<String>,
    username: Option<String>,
    password: Option<String>,
    verify_certificates: Option<bool>,
    request_timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawRetrySettings {
    max_attempts: Option<u64>,
    initial_backoff_ms: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawRelateSettings {
    min_score: Option<f64>,
    max_results: Option<u64>,
    listing_cap: Option<u64>,
    concurrency: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawExportSettings {
    output_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

fn non_zero_u32(value: u64, key: &'static str) -> Result<NonZeroU32, LoadError> {
    let value_u32: u32 = value
        .try_into()
        .map_err(|_| LoadError::invalid(key, "value exceeds supported range for u32"))?;
    NonZeroU32::new(value_u32).ok_or_else(|| LoadError::invalid(key, "must be greater than zero"))
}

fn non_zero_usize(value: u64, key: &'static str) -> Result<NonZeroUsize, LoadError> {
    let value_usize: usize = value
        .try_into()
        .map_err(|_| LoadError::invalid(key, "value exceeds supported range for usize"))?;
    NonZeroUsize::new(value_usize)
        .ok_or_else(|| LoadError::invalid(key, "must be greater than zero"))
}
