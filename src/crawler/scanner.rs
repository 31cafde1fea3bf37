//! Offset-based pagination over the search endpoint
//!
//! The scanner is a small state machine. A non-empty page advances the offset by
//! one page; an empty page jumps two pages ahead, and too many empties in a row
//! end the run. Reaching the target settles the collected list (sorted by
//! followers, descending, then truncated).

use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::config::Config;
use crate::crawler::api::CreatorSource;
use crate::crawler::extract::CreatorExtractor;
use crate::metrics;
use crate::models::RunState;
use crate::storage::checkpoint::CheckpointManager;

/// Scanner state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    Scanning,
    /// No more useful results: too many empty pages or the offset ceiling
    Exhausted,
    TargetReached,
    /// Stopped by the caller before finishing
    Interrupted,
}

impl ScanState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Scanning)
    }
}

/// Pagination limits for a scan
#[derive(Debug, Clone)]
pub struct ScanLimits {
    pub page_size: u32,
    pub max_offset: u32,
    pub max_consecutive_empty: u32,
}

impl ScanLimits {
    pub fn from_config(config: &Config) -> Self {
        Self {
            page_size: config.page_size().max(1),
            max_offset: config.scan.max_offset,
            max_consecutive_empty: config.scan.max_consecutive_empty.max(1),
        }
    }
}

impl Default for ScanLimits {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// Drives search pagination for one keyword
pub struct PageScanner {
    source: Arc<dyn CreatorSource>,
    extractor: CreatorExtractor,
    limits: ScanLimits,
    checkpoints: Option<CheckpointManager>,
}

impl PageScanner {
    pub fn new(
        source: Arc<dyn CreatorSource>,
        extractor: CreatorExtractor,
        limits: ScanLimits,
    ) -> Self {
        Self {
            source,
            extractor,
            limits,
            checkpoints: None,
        }
    }

    /// Save a checkpoint every time the manager's interval comes round
    #[must_use]
    pub fn with_checkpoints(mut self, manager: CheckpointManager) -> Self {
        self.checkpoints = Some(manager);
        self
    }

    pub fn checkpoints(&self) -> Option<&CheckpointManager> {
        self.checkpoints.as_ref()
    }

    /// State implied by `state` before any further request
    pub fn check(&self, state: &RunState, target: usize) -> ScanState {
        if state.collected.len() >= target {
            ScanState::TargetReached
        } else if state.offset >= self.limits.max_offset
            || state.consecutive_empty >= self.limits.max_consecutive_empty
        {
            ScanState::Exhausted
        } else {
            ScanState::Scanning
        }
    }

    /// Request and process one page
    pub async fn step(&self, state: &mut RunState, target: usize) -> ScanState {
        let page_size = self.limits.page_size;
        state.search_count += 1;

        info!(
            search = state.search_count,
            offset = state.offset,
            collected = state.collected.len(),
            "Requesting search page"
        );

        let page = self
            .source
            .search_page(&state.keyword, state.offset, page_size)
            .await;
        let videos = page.videos();

        if videos.is_empty() {
            state.consecutive_empty += 1;
            warn!(
                empty = state.consecutive_empty,
                limit = self.limits.max_consecutive_empty,
                offset = state.offset,
                "Empty search page"
            );

            if state.consecutive_empty >= self.limits.max_consecutive_empty {
                return ScanState::Exhausted;
            }
            state.offset = state.offset.saturating_add(page_size.saturating_mul(2));
            return ScanState::Scanning;
        }

        state.consecutive_empty = 0;

        let dedup = state.dedup.filter_videos(videos);
        metrics::record_videos(dedup.new_count(), dedup.duplicates);

        let extraction = self.extractor.extract(&dedup.new_videos, &mut state.dedup);
        info!(
            videos = page.items.len(),
            new_videos = dedup.new_count(),
            admitted = extraction.admitted.len(),
            below_threshold = extraction.below_threshold,
            "Processed search page"
        );
        state.collected.extend(extraction.admitted);
        state.offset = state.offset.saturating_add(page_size);

        if state.collected.len() >= target {
            info!(target = target, "Target reached, settling collected creators");
            state.settle(target);
            return ScanState::TargetReached;
        }

        ScanState::Scanning
    }

    /// Scan until a terminal state
    ///
    /// `stop` is checked before every page. Checkpoint write failures are logged
    /// and never end the scan.
    pub async fn run(
        &self,
        state: &mut RunState,
        target: usize,
        stop: &watch::Receiver<bool>,
    ) -> ScanState {
        let outcome = loop {
            match self.check(state, target) {
                ScanState::Scanning => {}
                ScanState::TargetReached => {
                    state.settle(target);
                    break ScanState::TargetReached;
                }
                terminal => break terminal,
            }

            if *stop.borrow() {
                info!(keyword = %state.keyword, "Stop requested, ending scan");
                break ScanState::Interrupted;
            }

            let next = self.step(state, target).await;
            state.touch();
            self.maybe_checkpoint(state);

            if next.is_terminal() {
                break next;
            }
        };

        let stats = state.stats();
        info!(
            keyword = %state.keyword,
            state = ?outcome,
            searches = stats.searches,
            videos = stats.videos_seen,
            collected = stats.collected,
            "Scan finished"
        );
        outcome
    }

    fn maybe_checkpoint(&self, state: &RunState) {
        let Some(manager) = &self.checkpoints else {
            return;
        };
        if manager.should_auto_save() {
            if let Err(e) = manager.save_run(state) {
                warn!(error = %e, "Failed to write checkpoint");
            }
        }
    }
}
