//! Derived metrics and pricing for enriched creators
//!
//! All constants come from [`ScoringConfig`], so results can be checked against
//! literal values and tuned without code changes. Given identical inputs and the
//! same `now`, every function here is deterministic.

pub mod bio;

use chrono::{DateTime, Utc};

use crate::config::ScoringConfig;
use crate::models::{EnrichedCreator, RecentVideo};

/// Timestamps above this are taken to be milliseconds
const MILLIS_THRESHOLD: i64 = 1_000_000_000_000;

const SECONDS_PER_DAY: i64 = 86_400;

/// Computes play statistics, recency and expected price
#[derive(Debug, Clone, Default)]
pub struct ScoringEngine {
    config: ScoringConfig,
}

/// Play counts that are strictly positive; zero means "no data" upstream
pub fn positive_samples(videos: &[RecentVideo]) -> Vec<u64> {
    videos
        .iter()
        .map(|v| v.play_count)
        .filter(|&c| c > 0)
        .collect()
}

/// Arithmetic mean, 0 for no samples
pub fn average(samples: &[u64]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    samples.iter().map(|&s| s as f64).sum::<f64>() / samples.len() as f64
}

/// Median with the usual even-count rule, 0 for no samples
pub fn median(samples: &[u64]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    let mut sorted = samples.to_vec();
    sorted.sort_unstable();

    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] as f64 + sorted[mid] as f64) / 2.0
    } else {
        sorted[mid] as f64
    }
}

/// Normalize a second-or-millisecond timestamp to seconds
pub fn to_seconds(timestamp: i64) -> i64 {
    if timestamp > MILLIS_THRESHOLD {
        timestamp / 1000
    } else {
        timestamp
    }
}

/// Whole days between `timestamp` and `now`, -1 when there is no timestamp
///
/// Timestamps in the future count as zero days.
pub fn days_since(timestamp: Option<i64>, now: DateTime<Utc>) -> i64 {
    match timestamp.filter(|&t| t > 0) {
        Some(ts) => {
            let elapsed = now.timestamp() - to_seconds(ts);
            elapsed.max(0).div_euclid(SECONDS_PER_DAY)
        }
        None => -1,
    }
}

/// log10(followers + 1)
pub fn follower_factor(followers: u64) -> f64 {
    (followers as f64 + 1.0).log10()
}

/// Likes per video relative to average plays, 0 when there are no plays
pub fn engagement_rate(likes: u64, videos: u64, avg_play_count: f64) -> f64 {
    if avg_play_count <= 0.0 {
        return 0.0;
    }
    (likes as f64 / videos.max(1) as f64) / avg_play_count
}

/// Whether the last post falls within `active_days`; unknown (-1) is inactive
pub fn is_active(days_since_last_video: i64, active_days: i64) -> bool {
    (0..=active_days).contains(&days_since_last_video)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

impl ScoringEngine {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Recency-weighted play count; weights apply by position, newest first
    pub fn weighted_views(&self, videos: &[RecentVideo]) -> f64 {
        self.config
            .recency_weights
            .iter()
            .zip(videos)
            .map(|(w, v)| w * v.play_count as f64)
            .sum()
    }

    /// Price bounded below by the configured floor, rounded to cents
    pub fn expected_price(
        &self,
        weighted_views: f64,
        follower_factor: f64,
        engagement_rate: f64,
    ) -> f64 {
        let raw = weighted_views / self.config.views_divisor
            + follower_factor * self.config.follower_factor_weight
            + engagement_rate * self.config.engagement_weight;

        let price = if raw.is_finite() {
            raw.max(self.config.price_floor)
        } else {
            self.config.price_floor
        };
        round2(price)
    }

    /// Fill in every derived metric of `creator` from its counts and recent videos
    pub fn score(&self, creator: &mut EnrichedCreator, now: DateTime<Utc>) {
        let samples = positive_samples(&creator.recent_videos);
        creator.avg_play_count = average(&samples);
        creator.median_play_count = median(&samples);

        let latest = creator
            .recent_videos
            .iter()
            .map(|v| to_seconds(v.create_time))
            .filter(|&t| t > 0)
            .max();
        creator.days_since_last_video = days_since(latest, now);

        creator.weighted_views = self.weighted_views(&creator.recent_videos);
        creator.engagement_rate = engagement_rate(
            creator.candidate.like_count,
            creator.candidate.video_count,
            creator.avg_play_count,
        );

        creator.expected_price = self.expected_price(
            creator.weighted_views,
            follower_factor(creator.candidate.follower_count),
            creator.engagement_rate,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn videos(plays: &[u64]) -> Vec<RecentVideo> {
        plays
            .iter()
            .map(|&p| RecentVideo {
                play_count: p,
                ..Default::default()
            })
            .collect()
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_avg_and_median_ignore_zero_samples() {
        let zeros = positive_samples(&videos(&[0, 0, 0]));
        assert_eq!(average(&zeros), 0.0);
        assert_eq!(median(&zeros), 0.0);

        let mixed = positive_samples(&videos(&[100, 0, 300]));
        assert_eq!(average(&mixed), 200.0);
        assert_eq!(median(&mixed), 200.0);

        let odd = positive_samples(&videos(&[5, 1, 9]));
        assert_eq!(median(&odd), 5.0);
    }

    #[test]
    fn test_days_since() {
        let now = now();
        assert_eq!(days_since(None, now), -1);
        assert_eq!(days_since(Some(0), now), -1);

        let ten_days_ago = now.timestamp() - 10 * SECONDS_PER_DAY - 5;
        assert_eq!(days_since(Some(ten_days_ago), now), 10);
        assert_eq!(days_since(Some(ten_days_ago * 1000), now), 10);

        let tomorrow = now.timestamp() + SECONDS_PER_DAY;
        assert_eq!(days_since(Some(tomorrow), now), 0);
    }

    #[test]
    fn test_weighted_views_positional() {
        let engine = ScoringEngine::default();
        let wv = engine.weighted_views(&videos(&[1000, 1000, 1000, 1000, 1000]));
        assert!((wv - 1000.0).abs() < 1e-9);

        let wv = engine.weighted_views(&videos(&[10_000, 0]));
        assert!((wv - 4000.0).abs() < 1e-9);

        assert_eq!(engine.weighted_views(&[]), 0.0);
    }

    #[test]
    fn test_engagement_rate() {
        assert_eq!(engagement_rate(1000, 10, 0.0), 0.0);
        assert!((engagement_rate(1000, 10, 200.0) - 0.5).abs() < 1e-9);
        assert!((engagement_rate(1000, 0, 1000.0) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_price_floor_applies() {
        let engine = ScoringEngine::default();
        assert_eq!(engine.expected_price(0.0, 0.0, 0.0), 80.0);
        assert_eq!(engine.expected_price(f64::NAN, 0.0, 0.0), 80.0);
    }

    #[test]
    fn test_price_formula() {
        let engine = ScoringEngine::default();
        // 100_000/1000 + 4*5 + 0.5*50 = 145
        assert_eq!(engine.expected_price(100_000.0, 4.0, 0.5), 145.0);
        assert_eq!(engine.expected_price(100_123.0, 4.0, 0.5), 145.12);
    }

    #[test]
    fn test_score_fills_metrics() {
        let engine = ScoringEngine::default();
        let now = now();
        let mut creator = EnrichedCreator::default();
        creator.candidate.follower_count = 9999;
        creator.candidate.like_count = 50_000;
        creator.candidate.video_count = 10;
        creator.recent_videos = vec![
            RecentVideo {
                play_count: 100_000,
                create_time: (now.timestamp() - 3 * SECONDS_PER_DAY) * 1000,
                ..Default::default()
            },
            RecentVideo {
                play_count: 0,
                create_time: now.timestamp() - 20 * SECONDS_PER_DAY,
                ..Default::default()
            },
        ];

        engine.score(&mut creator, now);
        assert_eq!(creator.avg_play_count, 100_000.0);
        assert_eq!(creator.days_since_last_video, 3);
        assert!((creator.weighted_views - 40_000.0).abs() < 1e-9);
        assert!((creator.engagement_rate - 0.05).abs() < 1e-9);
        // 40 + log10(10000)*5 + 0.05*50 = 62.5 -> floor
        assert_eq!(creator.expected_price, 80.0);
        assert!(is_active(creator.days_since_last_video, 30));
        assert!(!is_active(-1, 30));
        assert!(!is_active(31, 30));
    }

    #[test]
    fn test_score_without_videos() {
        let engine = ScoringEngine::default();
        let mut creator = EnrichedCreator::default();
        engine.score(&mut creator, now());
        assert_eq!(creator.days_since_last_video, -1);
        assert_eq!(creator.median_play_count, 0.0);
        assert_eq!(creator.expected_price, 80.0);
    }
}
