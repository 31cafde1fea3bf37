//! creator-scout - Keyword-driven creator discovery
//!
//! Searches short-video results for a keyword, collects the creators behind
//! them, enriches each one with profile and recent-video data, and writes a
//! ranked table with an estimated price per creator.
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - [`config`] - Configuration management and settings
//! - [`crawler`] - Rate-limited fetching, pagination, extraction and enrichment
//! - [`scoring`] - Play-count statistics, bio parsing and price estimation
//! - [`models`] - Core data structures and types
//! - [`storage`] - Deduplication sets, checkpoints and export files
//! - [`metrics`] - Prometheus counters for requests and admissions
//! - [`utils`] - Common utilities and helpers
//!
//! # Example
//!
//! ```no_run
//! use creator_scout::config::Config;
//! use creator_scout::crawler::{RateLimitedFetcher, TikHubClient};
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     config.validate()?;
//!     let fetcher = RateLimitedFetcher::new(&config)?;
//!     let _client = TikHubClient::new(fetcher, &config);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod crawler;
pub mod error;
pub mod metrics;
pub mod models;
pub mod scoring;
pub mod storage;
pub mod utils;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::crawler::{
        CreatorExtractor, CreatorSource, EnrichmentBatcher, PageScanner, RateLimitedFetcher,
        ScanLimits, ScanState, TikHubClient,
    };
    pub use crate::error::{Error, ErrorCategory, Result, ScoutErrorTrait};
    pub use crate::models::{CreatorCandidate, EnrichedCreator, IdentityKey, RunState, RunStats};
    pub use crate::scoring::ScoringEngine;
    pub use crate::storage::{CheckpointManager, Deduplicator, Exporter};
}

// Direct re-exports for convenience
pub use models::{CreatorCandidate, EnrichedCreator, RunState, RunStats};
