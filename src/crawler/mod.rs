//! Search crawling with rate limiting
//!
//! This module holds the pipeline stages that talk to the upstream API: the
//! rate-limited fetcher, the typed API client, the page scanner, creator
//! extraction, per-creator enrichment, and the pipeline that runs them for one
//! keyword.

pub mod api;
pub mod enrich;
pub mod extract;
pub mod fetcher;
pub mod pipeline;
pub mod scanner;

pub use api::{CreatorSource, TikHubClient};
pub use enrich::{EnrichStatus, EnrichmentBatcher, EnrichmentOutcome};
pub use extract::{CreatorExtractor, ExtractionResult};
pub use fetcher::RateLimitedFetcher;
pub use pipeline::{KeywordOutcome, KeywordPipeline, KeywordReport};
pub use scanner::{PageScanner, ScanLimits, ScanState};
