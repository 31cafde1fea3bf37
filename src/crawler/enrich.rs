//! Per-creator enrichment in throttled batches
//!
//! Each admitted creator gets a profile lookup, an optional web-profile lookup
//! and a recent-videos lookup. A failed creator is kept with its extraction-time
//! fields. Output order always equals admission order, even when several creators
//! are enriched at once.

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::config::EnrichConfig;
use crate::crawler::api::CreatorSource;
use crate::metrics;
use crate::models::{CreatorCandidate, EnrichedCreator, ProfileDetail, RecentVideo, WebProfile};
use crate::scoring::{bio, to_seconds, ScoringEngine};
use crate::utils::retry::{Sleeper, TokioSleeper};

/// What happened to one creator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnrichStatus {
    Enriched,
    Failed,
    /// Not attempted because the run was interrupted
    Skipped,
}

/// Result of enriching a list of candidates
#[derive(Debug, Clone, Default)]
pub struct EnrichmentOutcome {
    /// One entry per candidate, in admission order
    pub creators: Vec<EnrichedCreator>,
    pub enriched: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl EnrichmentOutcome {
    pub fn interrupted(&self) -> bool {
        self.skipped > 0
    }
}

/// Enriches candidates through a [`CreatorSource`] and scores them
pub struct EnrichmentBatcher {
    source: Arc<dyn CreatorSource>,
    config: EnrichConfig,
    scoring: ScoringEngine,
    sleeper: Arc<dyn Sleeper>,
}

impl EnrichmentBatcher {
    pub fn new(
        source: Arc<dyn CreatorSource>,
        config: EnrichConfig,
        scoring: ScoringEngine,
    ) -> Self {
        Self {
            source,
            config,
            scoring,
            sleeper: Arc::new(TokioSleeper),
        }
    }

    /// Replace the sleeper used for per-creator and between-batch pauses
    #[must_use]
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// Enrich and score every candidate
    ///
    /// Once `stop` turns true, remaining creators are passed through unenriched
    /// and counted as skipped.
    pub async fn enrich_all(
        &self,
        candidates: Vec<CreatorCandidate>,
        stop: &watch::Receiver<bool>,
        now: DateTime<Utc>,
    ) -> EnrichmentOutcome {
        let mut outcome = EnrichmentOutcome::default();
        let batch_size = self.config.batch_size.max(1);
        let concurrency = self.config.concurrency.max(1);
        let total_batches = candidates.len().div_ceil(batch_size);

        for (index, batch) in candidates.chunks(batch_size).enumerate() {
            if index > 0 && !*stop.borrow() {
                self.sleeper
                    .sleep(Duration::from_millis(self.config.batch_pause_ms))
                    .await;
            }

            info!(
                batch = index + 1,
                total_batches = total_batches,
                size = batch.len(),
                "Enriching batch"
            );

            let results: Vec<(EnrichedCreator, EnrichStatus)> =
                stream::iter(batch.iter().cloned())
                    .map(|candidate| self.enrich_one(candidate, stop, now))
                    .buffered(concurrency)
                    .collect()
                    .await;

            for (creator, status) in results {
                match status {
                    EnrichStatus::Enriched => outcome.enriched += 1,
                    EnrichStatus::Failed => outcome.failed += 1,
                    EnrichStatus::Skipped => outcome.skipped += 1,
                }
                outcome.creators.push(creator);
            }
        }

        info!(
            enriched = outcome.enriched,
            failed = outcome.failed,
            skipped = outcome.skipped,
            "Enrichment finished"
        );
        outcome
    }

    /// Score candidates from extraction-time data only
    pub fn score_only(
        &self,
        candidates: Vec<CreatorCandidate>,
        now: DateTime<Utc>,
    ) -> Vec<EnrichedCreator> {
        candidates
            .into_iter()
            .map(|candidate| self.finish(candidate, None, None, Vec::new(), false, now))
            .collect()
    }

    async fn enrich_one(
        &self,
        candidate: CreatorCandidate,
        stop: &watch::Receiver<bool>,
        now: DateTime<Utc>,
    ) -> (EnrichedCreator, EnrichStatus) {
        if *stop.borrow() {
            let creator = self.finish(candidate, None, None, Vec::new(), false, now);
            return (creator, EnrichStatus::Skipped);
        }

        self.sleeper
            .sleep(Duration::from_millis(self.config.per_creator_delay_ms))
            .await;

        let profile = self
            .source
            .user_profile(&candidate.unique_id, &candidate.sec_uid)
            .await;

        let web = if self.config.web_profile {
            self.source
                .web_profile(&candidate.unique_id, &candidate.sec_uid)
                .await
        } else {
            None
        };

        let videos = self
            .source
            .user_videos(&candidate.sec_uid, self.config.recent_video_fetch)
            .await;

        let success = profile.is_some() || web.is_some() || !videos.is_empty();
        metrics::record_enrichment(success);

        if success {
            debug!(creator = candidate.label(), videos = videos.len(), "Enriched creator");
        } else {
            warn!(
                creator = candidate.label(),
                "Enrichment returned no data, keeping extracted fields"
            );
        }

        let status = if success {
            EnrichStatus::Enriched
        } else {
            EnrichStatus::Failed
        };
        let creator = self.finish(candidate, profile, web, videos, success, now);
        (creator, status)
    }

    /// Merge lookups into the candidate and compute derived fields
    fn finish(
        &self,
        mut candidate: CreatorCandidate,
        profile: Option<ProfileDetail>,
        web: Option<WebProfile>,
        videos: Vec<RecentVideo>,
        enriched: bool,
        now: DateTime<Utc>,
    ) -> EnrichedCreator {
        if let Some(profile) = profile {
            if let Some(followers) = profile.follower_count {
                candidate.follower_count = followers;
            }
            if let Some(count) = profile.video_count {
                candidate.video_count = count;
            }
            if let Some(likes) = profile.like_count {
                candidate.like_count = likes;
            }
            if let Some(bio) = profile.bio {
                candidate.bio = bio;
            }
            if let Some(verified) = profile.verified {
                candidate.verified = verified;
            }
        }

        let web = web.unwrap_or_default();
        let (bio_link, language) = if enriched {
            (
                bio::resolve_link(web.bio_link.as_deref(), &candidate.bio),
                bio::resolve_language(web.language.as_deref(), &candidate.bio),
            )
        } else {
            (String::new(), String::new())
        };

        let mut creator = EnrichedCreator {
            email: bio::extract_email(&candidate.bio),
            recent_videos: self.most_recent(videos),
            candidate,
            bio_link,
            language,
            enriched,
            ..Default::default()
        };
        self.scoring.score(&mut creator, now);
        creator
    }

    /// Newest first, cut to the configured number
    fn most_recent(&self, mut videos: Vec<RecentVideo>) -> Vec<RecentVideo> {
        videos.sort_by_key(|v| std::cmp::Reverse(to_seconds(v.create_time)));
        videos.truncate(self.config.recent_video_keep);
        videos
    }
}
