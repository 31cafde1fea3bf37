//! Property tests for scoring invariants

use chrono::{TimeZone, Utc};
use creator_scout::config::ScoringConfig;
use creator_scout::models::RecentVideo;
use creator_scout::scoring::{
    average, days_since, engagement_rate, follower_factor, median, positive_samples,
    ScoringEngine,
};
use proptest::prelude::*;

fn videos(plays: &[u64]) -> Vec<RecentVideo> {
    plays
        .iter()
        .map(|&play_count| RecentVideo {
            play_count,
            ..Default::default()
        })
        .collect()
}

#[test]
fn test_zero_samples_yield_zero_stats() {
    let samples = positive_samples(&videos(&[0, 0, 0]));
    assert_eq!(average(&samples), 0.0);
    assert_eq!(median(&samples), 0.0);
}

#[test]
fn test_even_count_median() {
    let samples = positive_samples(&videos(&[100, 0, 300]));
    assert_eq!(average(&samples), 200.0);
    assert_eq!(median(&samples), 200.0);
}

#[test]
fn test_all_zero_engagement_prices_at_floor() {
    let engine = ScoringEngine::default();
    assert_eq!(engine.expected_price(0.0, 0.0, 0.0), 80.0);
}

proptest! {
    #[test]
    fn prop_price_never_below_floor(
        plays in prop::collection::vec(0u64..10_000_000, 0..8),
        followers in 0u64..100_000_000,
        likes in 0u64..1_000_000_000,
        video_count in 0u64..10_000,
    ) {
        let engine = ScoringEngine::default();
        let recent = videos(&plays);
        let avg = average(&positive_samples(&recent));

        let price = engine.expected_price(
            engine.weighted_views(&recent),
            follower_factor(followers),
            engagement_rate(likes, video_count, avg),
        );

        prop_assert!(price >= 80.0);
        prop_assert!(price.is_finite());
    }

    #[test]
    fn prop_price_is_deterministic(
        weighted in 0.0f64..1e9,
        factor in 0.0f64..10.0,
        rate in 0.0f64..1e6,
    ) {
        let a = ScoringEngine::new(ScoringConfig::default());
        let b = ScoringEngine::new(ScoringConfig::default());
        prop_assert_eq!(
            a.expected_price(weighted, factor, rate),
            b.expected_price(weighted, factor, rate)
        );
    }

    #[test]
    fn prop_stats_ignore_zero_plays(
        plays in prop::collection::vec(0u64..1_000_000, 0..10),
    ) {
        let with_zeros = positive_samples(&videos(&plays));
        let nonzero: Vec<u64> = plays.iter().copied().filter(|&p| p > 0).collect();
        prop_assert_eq!(&with_zeros, &nonzero);

        let avg = average(&with_zeros);
        if nonzero.is_empty() {
            prop_assert_eq!(avg, 0.0);
            prop_assert_eq!(median(&with_zeros), 0.0);
        } else {
            let min = *nonzero.iter().min().unwrap() as f64;
            let max = *nonzero.iter().max().unwrap() as f64;
            prop_assert!(avg >= min && avg <= max);
        }
    }

    #[test]
    fn prop_millisecond_timestamps_match_seconds(
        secs in 1_500_000_000i64..1_750_000_000,
    ) {
        let now = Utc.with_ymd_and_hms(2025, 7, 1, 0, 0, 0).unwrap();
        let from_secs = days_since(Some(secs), now);
        let from_millis = days_since(Some(secs * 1000), now);
        prop_assert_eq!(from_secs, from_millis);
        prop_assert!(from_secs >= 0);
    }
}

#[test]
fn test_missing_timestamp_is_unknown() {
    let now = Utc::now();
    assert_eq!(days_since(None, now), -1);
    assert_eq!(days_since(Some(0), now), -1);
}
