//! Keyword pipeline integration tests
//!
//! Scan → extract → enrich → export against a mock API, plus resume from a
//! saved checkpoint.

use chrono::Utc;
use creator_scout::config::Config;
use creator_scout::crawler::{
    EnrichmentBatcher, KeywordOutcome, KeywordPipeline, ScanState, TikHubClient,
};
use creator_scout::models::{CreatorCandidate, RunState};
use creator_scout::scoring::ScoringEngine;
use creator_scout::storage::CheckpointManager;
use creator_scout::utils::retry::RecordingSleeper;
use serde_json::json;
use std::sync::Arc;
use tempfile::TempDir;
use tokio::sync::watch;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::common::{
    profile_body, search_body, search_item, test_client, test_config, videos_body,
};

async fn mount_search_page(server: &MockServer, config: &Config, offset: &str, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(config.api.search_path.as_str()))
        .and(query_param("offset", offset))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

async fn mount_creator(server: &MockServer, config: &Config, handle: &str, followers: u64, bio: &str) {
    Mock::given(method("GET"))
        .and(path(config.api.profile_path.as_str()))
        .and(query_param("unique_id", handle))
        .respond_with(ResponseTemplate::new(200).set_body_json(profile_body(followers, bio)))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path(config.api.web_profile_path.as_str()))
        .and(query_param("uniqueId", handle))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 200,
            "data": {"userInfo": {"user": {"language": "en"}}}
        })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path(config.api.videos_path.as_str()))
        .and(query_param("sec_user_id", format!("sec-{handle}")))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(videos_body(handle, &[100, 0, 300])),
        )
        .mount(server)
        .await;
}

fn pipeline(config: &Config, sleeper: &RecordingSleeper) -> KeywordPipeline {
    let client = test_client(config, sleeper);
    KeywordPipeline::new(Arc::new(client), config).with_sleeper(Arc::new(sleeper.clone()))
}

fn csv_rows(path: &std::path::Path) -> Vec<Vec<String>> {
    let content = std::fs::read_to_string(path).unwrap();
    let content = content.trim_start_matches('\u{feff}');
    content
        .lines()
        .map(|line| line.split(',').map(str::to_string).collect())
        .collect()
}

#[tokio::test]
async fn test_two_pages_collect_target_sorted_by_followers() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let mut config = test_config(&server.uri(), dir.path());
    config.scan.page_size = 2;

    mount_search_page(
        &server,
        &config,
        "0",
        search_body(vec![search_item("v1", "small", "sec-small", 5000)]),
    )
    .await;
    mount_search_page(
        &server,
        &config,
        "2",
        search_body(vec![search_item("v2", "big", "sec-big", 20_000)]),
    )
    .await;
    mount_creator(&server, &config, "small", 5000, "just vibes").await;
    mount_creator(&server, &config, "big", 20_000, "daily AI tips").await;

    let sleeper = RecordingSleeper::new();
    let (_tx, rx) = watch::channel(false);
    let report = pipeline(&config, &sleeper)
        .run(RunState::new("AI"), 2, &rx)
        .await
        .unwrap();

    assert_eq!(report.outcome, KeywordOutcome::Success);
    assert_eq!(report.scan_state, ScanState::TargetReached);
    assert_eq!(report.stats.searches, 2);
    assert_eq!(report.creators, 2);
    assert_eq!(report.enriched, 2);
    assert_eq!(report.artifacts.sequence, 1);

    let followers: Vec<u64> = report
        .artifacts
        .report
        .top_creators
        .iter()
        .map(|c| c.follower_count)
        .collect();
    assert_eq!(followers, vec![20_000, 5000]);

    let rows = csv_rows(report.artifacts.csv_path.as_ref().unwrap());
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0][0], "search_keyword");
    assert_eq!(rows[0].len(), 25);
    assert_eq!(rows[1][0], "AI");
    assert_eq!(rows[1][2], "big");
    assert_eq!(rows[2][2], "small");
    // avg and median over positive plays [100, 300]
    assert_eq!(rows[1][6], "200.00");
    assert_eq!(rows[1][7], "200.00");
    assert_eq!(rows[1][14], "en");
}

#[tokio::test]
async fn test_enrichment_reads_email_and_link_from_bio() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = test_config(&server.uri(), dir.path());
    let bio = "contact me at hello@example.com or visit linktr.ee/me";
    mount_creator(&server, &config, "linky", 8000, bio).await;

    let sleeper = RecordingSleeper::new();
    let client: TikHubClient = test_client(&config, &sleeper);
    let batcher = EnrichmentBatcher::new(
        Arc::new(client),
        config.enrich.clone(),
        ScoringEngine::new(config.scoring.clone()),
    )
    .with_sleeper(Arc::new(sleeper.clone()));

    let candidate = CreatorCandidate {
        identity_key: "linky".into(),
        unique_id: "linky".into(),
        sec_uid: "sec-linky".into(),
        follower_count: 8000,
        ..Default::default()
    };
    let (_tx, rx) = watch::channel(false);
    let outcome = batcher.enrich_all(vec![candidate], &rx, Utc::now()).await;

    assert_eq!(outcome.enriched, 1);
    let creator = &outcome.creators[0];
    assert_eq!(creator.candidate.bio, bio);
    assert_eq!(creator.email, "hello@example.com");
    assert!(creator.bio_link.contains("linktr.ee/me"));
    assert_eq!(creator.recent_videos.len(), 3);
    assert!(creator.expected_price >= 80.0);
}

#[tokio::test]
async fn test_resume_continues_from_saved_offset() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let mut config = test_config(&server.uri(), dir.path());
    config.scan.page_size = 2;

    Mock::given(method("GET"))
        .and(path(config.api.search_path.as_str()))
        .and(query_param("offset", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(search_body(vec![])))
        .expect(0)
        .mount(&server)
        .await;
    // v1 reappears and "small" is already known; only "big" is new
    mount_search_page(
        &server,
        &config,
        "2",
        search_body(vec![
            search_item("v1", "small", "sec-small", 5000),
            search_item("v2", "big", "sec-big", 20_000),
        ]),
    )
    .await;
    mount_creator(&server, &config, "small", 5000, "").await;
    mount_creator(&server, &config, "big", 20_000, "").await;

    let mut state = RunState::new("AI");
    state.search_count = 1;
    state.offset = 2;
    state.dedup.insert_video("v1");
    state
        .dedup
        .insert_creator(creator_scout::models::IdentityKey::derive("small", "", "").unwrap());
    state.collected.push(CreatorCandidate {
        identity_key: "small".into(),
        unique_id: "small".into(),
        sec_uid: "sec-small".into(),
        follower_count: 5000,
        ..Default::default()
    });

    let manager = CheckpointManager::new(dir.path()).unwrap();
    let saved_path = manager.save_run(&state).unwrap();
    let restored = manager.load_path(&saved_path).unwrap();
    assert_eq!(restored.state.run_id, state.run_id);

    let sleeper = RecordingSleeper::new();
    let (_tx, rx) = watch::channel(false);
    let report = pipeline(&config, &sleeper)
        .run(restored.state, 2, &rx)
        .await
        .unwrap();

    assert_eq!(report.scan_state, ScanState::TargetReached);
    assert_eq!(report.stats.searches, 2);
    assert_eq!(report.stats.videos_seen, 2);
    assert_eq!(report.creators, 2);
    let handles: Vec<&str> = report
        .artifacts
        .report
        .top_creators
        .iter()
        .map(|c| c.unique_id.as_str())
        .collect();
    assert_eq!(handles, vec!["big", "small"]);
}

#[tokio::test]
async fn test_successive_keywords_get_increasing_sequence() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let mut config = test_config(&server.uri(), dir.path());
    config.scan.page_size = 2;
    config.scan.max_consecutive_empty = 1;

    Mock::given(method("GET"))
        .and(path(config.api.search_path.as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(search_body(vec![])))
        .mount(&server)
        .await;

    let sleeper = RecordingSleeper::new();
    let pipeline = pipeline(&config, &sleeper);
    let (_tx, rx) = watch::channel(false);

    let first = pipeline.run(RunState::new("cats"), 5, &rx).await.unwrap();
    let second = pipeline.run(RunState::new("dogs"), 5, &rx).await.unwrap();

    assert_eq!(first.outcome, KeywordOutcome::Empty);
    assert_eq!(first.artifacts.sequence, 1);
    assert_eq!(second.artifacts.sequence, 2);
    assert_eq!(second.artifacts.report.total_creators, 0);
}
