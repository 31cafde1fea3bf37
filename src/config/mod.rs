//! Configuration management for creator-scout
//!
//! Settings come from a TOML file or from `SCOUT_*` environment variables, with
//! defaults matching the upstream API's limits. Every section deserializes with
//! defaults so a config file only needs the values it overrides.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::utils::retry::RetryPolicy;

/// Largest page the search endpoint will serve
pub const MAX_PAGE_SIZE: u32 = 40;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Upstream API location and credentials
    pub api: ApiConfig,

    /// Request pacing and retry
    pub fetcher: FetcherConfig,

    /// Search pagination
    pub scan: ScanConfig,

    /// Per-creator detail lookups
    pub enrich: EnrichConfig,

    /// Scoring constants
    pub scoring: ScoringConfig,

    /// Artifact output
    pub output: OutputConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Upstream API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,

    /// Bearer token sent with every request
    pub api_key: String,

    pub search_path: String,
    pub profile_path: String,
    pub web_profile_path: String,
    pub videos_path: String,

    pub user_agent: String,
}

/// Rate limit, timeout and retry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetcherConfig {
    /// Requests per second shared by every call
    pub requests_per_second: u32,

    /// Retries after the first attempt
    pub max_retries: u32,

    pub base_delay_ms: u64,
    pub max_delay_ms: u64,

    /// Per-attempt timeout in seconds
    pub request_timeout_secs: u64,
}

/// Search pagination configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    pub page_size: u32,

    /// Offset at which a run gives up regardless of target
    pub max_offset: u32,

    pub max_consecutive_empty: u32,

    /// 0 = relevance
    pub sort_type: u32,

    /// 0 = any time
    pub publish_time: u32,

    /// Creators to collect when the CLI gives no target
    pub default_target: usize,
}

/// Enrichment configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnrichConfig {
    pub batch_size: usize,
    pub per_creator_delay_ms: u64,
    pub batch_pause_ms: u64,

    /// Videos requested per creator
    pub recent_video_fetch: u32,

    /// Videos kept after sorting newest first
    pub recent_video_keep: usize,

    /// Creators enriched at once within a batch
    pub concurrency: usize,

    /// Also query the web profile for bio link and language
    pub web_profile: bool,
}

/// Scoring constants
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScoringConfig {
    /// Admission threshold, applied when a creator is first seen
    pub min_followers: u64,

    /// Weights for the most recent videos, newest first
    pub recency_weights: Vec<f64>,

    pub price_floor: f64,
    pub views_divisor: f64,
    pub follower_factor_weight: f64,
    pub engagement_weight: f64,

    /// A creator counts as active when the last video is at most this many days old
    pub active_days: i64,

    /// Creators listed in the report
    pub top_n: usize,
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: PathBuf,

    /// Scan iterations between checkpoints
    pub checkpoint_interval: u64,

    pub write_csv: bool,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (text, json)
    pub format: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: String::from("https://api.tikhub.io"),
            api_key: String::new(),
            search_path: String::from("/api/v1/tiktok/app/v3/fetch_general_search_result"),
            profile_path: String::from("/api/v1/tiktok/app/v3/handler_user_profile"),
            web_profile_path: String::from("/api/v1/tiktok/web/fetch_user_profile"),
            videos_path: String::from("/api/v1/tiktok/app/v3/fetch_user_post_videos"),
            user_agent: format!("creator-scout/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            requests_per_second: 10,
            max_retries: 3,
            base_delay_ms: 1000,
            max_delay_ms: 30_000,
            request_timeout_secs: 45,
        }
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            page_size: 30,
            max_offset: 10_000,
            max_consecutive_empty: 3,
            sort_type: 0,
            publish_time: 0,
            default_target: 20,
        }
    }
}

impl Default for EnrichConfig {
    fn default() -> Self {
        Self {
            batch_size: 50,
            per_creator_delay_ms: 150,
            batch_pause_ms: 1000,
            recent_video_fetch: 15,
            recent_video_keep: 5,
            concurrency: 1,
            web_profile: true,
        }
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            min_followers: 1000,
            recency_weights: vec![0.4, 0.25, 0.15, 0.1, 0.1],
            price_floor: 80.0,
            views_divisor: 1000.0,
            follower_factor_weight: 5.0,
            engagement_weight: 50.0,
            active_days: 30,
            top_n: 10,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("output"),
            checkpoint_interval: 100,
            write_csv: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: String::from("info"),
            format: String::from("text"),
        }
    }
}

fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env();
        Ok(config)
    }

    /// Override values with any `SCOUT_*` variables that are set
    pub fn apply_env(&mut self) {
        if let Ok(key) = std::env::var("SCOUT_API_KEY").or_else(|_| std::env::var("TIKHUB_API_KEY"))
        {
            self.api.api_key = key;
        }
        if let Ok(url) = std::env::var("SCOUT_BASE_URL") {
            self.api.base_url = url;
        }
        if let Some(rps) = env_parse("SCOUT_RATE_LIMIT") {
            self.fetcher.requests_per_second = rps;
        }
        if let Some(retries) = env_parse("SCOUT_MAX_RETRIES") {
            self.fetcher.max_retries = retries;
        }
        if let Some(timeout) = env_parse("SCOUT_REQUEST_TIMEOUT") {
            self.fetcher.request_timeout_secs = timeout;
        }
        if let Some(size) = env_parse("SCOUT_PAGE_SIZE") {
            self.scan.page_size = size;
        }
        if let Some(max) = env_parse("SCOUT_MAX_OFFSET") {
            self.scan.max_offset = max;
        }
        if let Some(size) = env_parse("SCOUT_BATCH_SIZE") {
            self.enrich.batch_size = size;
        }
        if let Some(n) = env_parse("SCOUT_ENRICH_CONCURRENCY") {
            self.enrich.concurrency = n;
        }
        if let Some(min) = env_parse("SCOUT_MIN_FOLLOWERS") {
            self.scoring.min_followers = min;
        }
        if let Ok(dir) = std::env::var("SCOUT_OUTPUT_DIR") {
            self.output.dir = PathBuf::from(dir);
        }
        if let Some(interval) = env_parse("SCOUT_CHECKPOINT_INTERVAL") {
            self.output.checkpoint_interval = interval;
        }
        if let Ok(level) = std::env::var("SCOUT_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("SCOUT_LOG_FORMAT") {
            self.logging.format = format;
        }
    }

    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config file: {}", path.display()))?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.api.api_key.trim().is_empty() {
            anyhow::bail!("api_key is required (set SCOUT_API_KEY)");
        }

        if url::Url::parse(&self.api.base_url).is_err() {
            anyhow::bail!("base_url is not a valid URL: {}", self.api.base_url);
        }

        if self.fetcher.requests_per_second == 0 {
            anyhow::bail!("requests_per_second must be greater than 0");
        }

        if self.scan.page_size == 0 {
            anyhow::bail!("page_size must be greater than 0");
        }

        if self.enrich.batch_size == 0 {
            anyhow::bail!("batch_size must be greater than 0");
        }

        if self.enrich.concurrency == 0 {
            anyhow::bail!("concurrency must be greater than 0");
        }

        if self.output.checkpoint_interval == 0 {
            anyhow::bail!("checkpoint_interval must be greater than 0");
        }

        if self.scoring.recency_weights.is_empty() {
            anyhow::bail!("recency_weights must not be empty");
        }

        Ok(())
    }

    /// Page size actually requested, capped at the API maximum
    #[must_use]
    pub fn page_size(&self) -> u32 {
        self.scan.page_size.min(MAX_PAGE_SIZE)
    }

    /// Get request timeout as Duration
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.fetcher.request_timeout_secs)
    }

    /// Retry policy shared by every outbound call
    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::with_delays(
            self.fetcher.max_retries,
            self.fetcher.base_delay_ms,
            self.fetcher.max_delay_ms,
        )
    }
}
