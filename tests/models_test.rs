//! Tests for run state, identity keys and admission invariants

mod common;

use creator_scout::crawler::CreatorExtractor;
use creator_scout::models::{IdentityKey, RunState, SearchPage};
use proptest::prelude::*;
use std::collections::HashSet;

#[test]
fn test_identity_key_prefers_handle() {
    let key = IdentityKey::derive("alice", "123", "MS4w").unwrap();
    assert_eq!(key.as_str(), "alice");

    let key = IdentityKey::derive("  ", "123", "MS4w").unwrap();
    assert_eq!(key.as_str(), "123");

    assert!(IdentityKey::derive("", "", "").is_none());
}

#[test]
fn test_search_page_keeps_only_video_items() {
    let page = SearchPage::new(
        0,
        3,
        vec![
            common::search_item("v1", "a", "sa", 5000),
            serde_json::json!({"type": 4, "aweme_info": {"aweme_id": "x"}}),
            serde_json::json!({"type": 1}),
        ],
    );
    let videos = page.videos();
    assert_eq!(videos.len(), 1);
    assert_eq!(videos[0].video_id, "v1");
}

#[test]
fn test_run_state_checkpoint_roundtrip_keeps_seen_sets() {
    let mut state = RunState::new("AI");
    state.dedup.insert_video("v1");
    state.dedup.insert_creator(IdentityKey::derive("a", "", "").unwrap());

    let json = serde_json::to_string(&state).unwrap();
    let restored: RunState = serde_json::from_str(&json).unwrap();

    assert!(restored.dedup.has_video("v1"));
    assert!(restored
        .dedup
        .has_creator(&IdentityKey::derive("a", "", "").unwrap()));
    assert_eq!(restored.keyword, "AI");
}

proptest! {
    /// Settled lists never exceed the target and stay sorted by followers
    #[test]
    fn prop_settle_bounds_and_orders(
        followers in prop::collection::vec(1000u64..1_000_000, 0..40),
        target in 1usize..20,
    ) {
        let mut state = RunState::new("AI");
        for (i, f) in followers.iter().enumerate() {
            state.collected.push(creator_scout::models::CreatorCandidate {
                identity_key: format!("c{i}"),
                follower_count: *f,
                ..Default::default()
            });
        }
        state.settle(target);

        prop_assert!(state.collected.len() <= target);
        prop_assert!(state
            .collected
            .windows(2)
            .all(|w| w[0].follower_count >= w[1].follower_count));
    }

    /// Admitted creators are unique and all meet the follower threshold
    #[test]
    fn prop_admission_unique_and_above_threshold(
        authors in prop::collection::vec((0usize..8, 0u64..5000), 1..60),
    ) {
        let extractor = CreatorExtractor::new(1000);
        let mut state = RunState::new("AI");

        let items = authors
            .iter()
            .enumerate()
            .map(|(i, (handle, followers))| {
                common::search_item(&format!("v{i}"), &format!("h{handle}"), "", *followers)
            })
            .collect();
        let page = SearchPage::new(0, 60, items);
        let fresh = state.dedup.filter_videos(page.videos());
        let result = extractor.extract(&fresh.new_videos, &mut state.dedup);

        let mut keys = HashSet::new();
        for creator in &result.admitted {
            prop_assert!(creator.follower_count >= 1000);
            prop_assert!(keys.insert(creator.identity_key.clone()));
        }
        prop_assert_eq!(state.dedup.videos_seen(), authors.len());
    }
}
