//! One keyword, start to finish
//!
//! The pipeline chains the stages for a single keyword:
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │    Page     │     │  Creator    │     │ Enrichment  │     │   Export    │
//! │   Scanner   │────▶│  Extractor  │────▶│  + Scoring  │────▶│  CSV/JSON   │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//!       │                                                           │
//!       └──────────── checkpoints (every N pages, on stop) ─────────┘
//! ```
//!
//! A stop signal ends scanning before the next page and enrichment before the
//! next creator. Whatever was collected is still exported and the run is
//! reported as [`KeywordOutcome::Partial`].
//!
//! # Example
//!
//! ```no_run
//! use creator_scout::config::Config;
//! use creator_scout::crawler::pipeline::KeywordPipeline;
//! use creator_scout::crawler::{RateLimitedFetcher, TikHubClient};
//! use creator_scout::models::RunState;
//! use std::sync::Arc;
//! use tokio::sync::watch;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = Config::from_env()?;
//! let client = TikHubClient::new(RateLimitedFetcher::new(&config)?, &config);
//! let pipeline = KeywordPipeline::new(Arc::new(client), &config);
//!
//! let (_stop_tx, stop_rx) = watch::channel(false);
//! let report = pipeline.run(RunState::new("AI"), 20, &stop_rx).await?;
//! println!("{} creators, {:?}", report.creators, report.outcome);
//! # Ok(())
//! # }
//! ```

use chrono::Utc;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::config::Config;
use crate::crawler::api::CreatorSource;
use crate::crawler::enrich::EnrichmentBatcher;
use crate::crawler::extract::CreatorExtractor;
use crate::crawler::scanner::{PageScanner, ScanLimits, ScanState};
use crate::error::Result;
use crate::metrics;
use crate::models::{EnrichedCreator, RunState, RunStats};
use crate::scoring::ScoringEngine;
use crate::storage::checkpoint::CheckpointManager;
use crate::storage::export::{ExportArtifacts, Exporter};
use crate::utils::retry::Sleeper;

// ============================================================================
// Outcome
// ============================================================================

/// Keyword-level status reported to the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeywordOutcome {
    /// At least one creator exported
    Success,
    /// Nothing found; not an error
    Empty,
    /// Stopped early, collected creators still exported
    Partial,
}

impl KeywordOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Empty => "empty",
            Self::Partial => "partial",
        }
    }

    fn classify(interrupted: bool, creators: usize) -> Self {
        if interrupted {
            Self::Partial
        } else if creators == 0 {
            Self::Empty
        } else {
            Self::Success
        }
    }
}

/// Summary of one keyword run
#[derive(Debug, Clone)]
pub struct KeywordReport {
    pub keyword: String,
    pub outcome: KeywordOutcome,
    pub scan_state: ScanState,
    pub stats: RunStats,
    /// Creators in the exported table
    pub creators: usize,
    pub enriched: usize,
    pub failed: usize,
    pub skipped: usize,
    pub artifacts: ExportArtifacts,
    /// Checkpoint written because the run was stopped
    pub checkpoint: Option<PathBuf>,
}

// ============================================================================
// Pipeline
// ============================================================================

/// Scan, enrich, settle and export one keyword
pub struct KeywordPipeline {
    scanner: PageScanner,
    batcher: EnrichmentBatcher,
    exporter: Exporter,
    skip_enrich: bool,
}

impl KeywordPipeline {
    pub fn new(source: Arc<dyn CreatorSource>, config: &Config) -> Self {
        let scanner = PageScanner::new(
            source.clone(),
            CreatorExtractor::new(config.scoring.min_followers),
            ScanLimits::from_config(config),
        );
        let batcher = EnrichmentBatcher::new(
            source,
            config.enrich.clone(),
            ScoringEngine::new(config.scoring.clone()),
        );

        Self {
            scanner,
            batcher,
            exporter: Exporter::new(config),
            skip_enrich: false,
        }
    }

    /// Periodic and on-stop checkpoints
    #[must_use]
    pub fn with_checkpoints(mut self, manager: CheckpointManager) -> Self {
        self.scanner = self.scanner.with_checkpoints(manager);
        self
    }

    #[must_use]
    pub fn with_exporter(mut self, exporter: Exporter) -> Self {
        self.exporter = exporter;
        self
    }

    /// Sleeper for the enrichment pauses
    #[must_use]
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.batcher = self.batcher.with_sleeper(sleeper);
        self
    }

    /// Score from extraction-time data only, without detail lookups
    #[must_use]
    pub fn skip_enrich(mut self, skip: bool) -> Self {
        self.skip_enrich = skip;
        self
    }

    /// Run one keyword from `state`, which may come from a checkpoint
    pub async fn run(
        &self,
        mut state: RunState,
        target: usize,
        stop: &watch::Receiver<bool>,
    ) -> Result<KeywordReport> {
        let started = Instant::now();
        if let Some(manager) = self.scanner.checkpoints() {
            manager.reset_counter();
        }

        info!(
            keyword = %state.keyword,
            target = target,
            offset = state.offset,
            run_id = %state.run_id,
            "Starting keyword run"
        );

        let scan_state = self.scanner.run(&mut state, target, stop).await;

        let now = Utc::now();
        let candidates = state.collected.clone();
        let (mut creators, enriched, failed, skipped) = if self.skip_enrich {
            let creators = self.batcher.score_only(candidates, now);
            (creators, 0, 0, 0)
        } else {
            let outcome = self.batcher.enrich_all(candidates, stop, now).await;
            (outcome.creators, outcome.enriched, outcome.failed, outcome.skipped)
        };

        settle(&mut creators, target);

        let interrupted = scan_state == ScanState::Interrupted || skipped > 0 || *stop.borrow();
        let checkpoint = if interrupted {
            self.checkpoint_on_stop(&state)
        } else {
            None
        };

        let artifacts =
            self.exporter
                .export(&state.keyword, &creators, state.dedup.videos_seen(), now)?;

        let outcome = KeywordOutcome::classify(interrupted, creators.len());
        metrics::record_run_duration(outcome.as_str(), started.elapsed().as_secs_f64());

        let report = KeywordReport {
            keyword: state.keyword.clone(),
            outcome,
            scan_state,
            stats: state.stats(),
            creators: creators.len(),
            enriched,
            failed,
            skipped,
            artifacts,
            checkpoint,
        };

        info!(
            keyword = %report.keyword,
            outcome = report.outcome.as_str(),
            creators = report.creators,
            enriched = report.enriched,
            failed = report.failed,
            skipped = report.skipped,
            "Keyword run finished"
        );
        Ok(report)
    }

    fn checkpoint_on_stop(&self, state: &RunState) -> Option<PathBuf> {
        let manager = self.scanner.checkpoints()?;
        match manager.save_run(state) {
            Ok(path) => Some(path),
            Err(e) => {
                warn!(keyword = %state.keyword, error = %e, "Failed to write stop checkpoint");
                None
            }
        }
    }
}

/// Final ordering: stable sort by refreshed follower count, descending, then cut
pub fn settle(creators: &mut Vec<EnrichedCreator>, target: usize) {
    creators.sort_by(|a, b| b.follower_count().cmp(&a.follower_count()));
    creators.truncate(target);
}

// ============================================================================
// Tests
// ============================================================================
