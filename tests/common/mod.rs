//! Common test utilities

#![allow(dead_code)]

use creator_scout::config::Config;
use creator_scout::crawler::{RateLimitedFetcher, TikHubClient};
use creator_scout::utils::retry::RecordingSleeper;
use serde_json::{json, Value};
use std::path::Path;
use std::sync::Arc;

/// One search item wrapping a video by `handle`
pub fn search_item(video_id: &str, handle: &str, sec_uid: &str, followers: u64) -> Value {
    json!({
        "type": 1,
        "aweme_info": {
            "aweme_id": video_id,
            "create_time": 1_700_000_000,
            "statistics": {"play_count": 1000},
            "author": {
                "uid": format!("uid-{handle}"),
                "unique_id": handle,
                "sec_uid": sec_uid,
                "nickname": format!("Creator {handle}"),
                "signature": "",
                "follower_count": followers,
                "aweme_count": 10,
                "total_favorited": 5000
            }
        }
    })
}

/// Search response body holding `items`
pub fn search_body(items: Vec<Value>) -> Value {
    json!({"code": 200, "data": {"data": items}})
}

/// App profile response
pub fn profile_body(followers: u64, bio: &str) -> Value {
    json!({
        "code": 200,
        "data": {"user": {
            "follower_count": followers,
            "aweme_count": 40,
            "total_favorited": 80_000,
            "signature": bio,
            "verification_type": 0
        }}
    })
}

/// User videos response with the given play counts, newest first
pub fn videos_body(handle: &str, plays: &[u64]) -> Value {
    let list: Vec<Value> = plays
        .iter()
        .enumerate()
        .map(|(i, play)| {
            json!({
                "aweme_id": format!("{handle}-{i}"),
                "desc": format!("video {i}"),
                "create_time": 1_700_000_000 - (i as i64) * 86_400,
                "statistics": {"play_count": play},
                "author": {"unique_id": handle}
            })
        })
        .collect();
    json!({"code": 200, "data": {"aweme_list": list}})
}

/// Config pointed at a mock server, writing into `dir`
pub fn test_config(base_url: &str, dir: &Path) -> Config {
    let mut config = Config::default();
    config.api.base_url = base_url.to_string();
    config.api.api_key = "test-key".to_string();
    config.fetcher.requests_per_second = 100;
    config.output.dir = dir.to_path_buf();
    config
}

/// API client whose retry backoff never actually sleeps
pub fn test_client(config: &Config, sleeper: &RecordingSleeper) -> TikHubClient {
    let fetcher = RateLimitedFetcher::new(config)
        .unwrap()
        .with_sleeper(Arc::new(sleeper.clone()));
    TikHubClient::new(fetcher, config)
}
