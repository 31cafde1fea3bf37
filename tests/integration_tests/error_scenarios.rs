//! Error scenario integration tests
//!
//! Tests failure modes that must never abort a keyword run:
//! 1. Search endpoint failing on every attempt
//! 2. Malformed search responses
//! 3. Profile lookups failing for one creator
//! 4. Invalid configuration caught before any request

use creator_scout::crawler::{KeywordOutcome, KeywordPipeline, ScanState};
use creator_scout::models::RunState;
use creator_scout::utils::retry::RecordingSleeper;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::watch;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::common::{profile_body, search_body, search_item, test_client, test_config};

// ============================================================================
// Search failures
// ============================================================================

#[tokio::test]
async fn test_failing_search_exhausts_as_empty() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = test_config(&server.uri(), dir.path());

    // 3 empty pages x (1 attempt + 3 retries)
    Mock::given(method("GET"))
        .and(path(config.api.search_path.as_str()))
        .respond_with(ResponseTemplate::new(500))
        .expect(12)
        .mount(&server)
        .await;

    let sleeper = RecordingSleeper::new();
    let pipeline = KeywordPipeline::new(Arc::new(test_client(&config, &sleeper)), &config);
    let (_tx, rx) = watch::channel(false);

    let report = pipeline.run(RunState::new("AI"), 5, &rx).await.unwrap();

    assert_eq!(report.outcome, KeywordOutcome::Empty);
    assert_eq!(report.scan_state, ScanState::Exhausted);
    assert_eq!(report.stats.searches, 3);
    assert_eq!(report.stats.offset, 120);
    assert_eq!(sleeper.total(), Duration::from_secs(3 * 7));

    // An empty run still writes a zeroed report
    assert!(report.artifacts.report_path.exists());
    assert_eq!(report.artifacts.report.total_creators, 0);
    assert_eq!(report.artifacts.report.avg_followers, 0.0);
}

#[tokio::test]
async fn test_malformed_search_response_is_an_empty_page() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let mut config = test_config(&server.uri(), dir.path());
    config.scan.max_consecutive_empty = 2;

    Mock::given(method("GET"))
        .and(path(config.api.search_path.as_str()))
        .and(query_param("offset", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{ truncated"))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(config.api.search_path.as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"code": 200, "data": {}})))
        .mount(&server)
        .await;

    let sleeper = RecordingSleeper::new();
    let pipeline = KeywordPipeline::new(Arc::new(test_client(&config, &sleeper)), &config);
    let (_tx, rx) = watch::channel(false);

    let report = pipeline.run(RunState::new("AI"), 5, &rx).await.unwrap();

    assert_eq!(report.scan_state, ScanState::Exhausted);
    assert_eq!(report.stats.searches, 2);
    assert!(sleeper.recorded().is_empty(), "decode errors are not retried");
}

#[tokio::test]
async fn test_below_threshold_creators_are_not_collected() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let mut config = test_config(&server.uri(), dir.path());
    config.scan.max_consecutive_empty = 1;

    Mock::given(method("GET"))
        .and(path(config.api.search_path.as_str()))
        .and(query_param("offset", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(search_body(vec![
            search_item("v1", "tiny", "sec-tiny", 999),
            json!({"type": 2, "user_info": {}}),
        ])))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(config.api.search_path.as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(search_body(vec![])))
        .mount(&server)
        .await;

    let sleeper = RecordingSleeper::new();
    let pipeline = KeywordPipeline::new(Arc::new(test_client(&config, &sleeper)), &config);
    let (_tx, rx) = watch::channel(false);

    let report = pipeline.run(RunState::new("AI"), 5, &rx).await.unwrap();

    assert_eq!(report.outcome, KeywordOutcome::Empty);
    assert_eq!(report.stats.videos_seen, 1);
    assert_eq!(report.stats.creators_seen, 0);
}

// ============================================================================
// Enrichment failures
// ============================================================================

#[tokio::test]
async fn test_failed_enrichment_keeps_creator() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let mut config = test_config(&server.uri(), dir.path());
    config.scan.page_size = 2;
    config.enrich.web_profile = false;

    Mock::given(method("GET"))
        .and(path(config.api.search_path.as_str()))
        .and(query_param("offset", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(search_body(vec![
            search_item("v1", "ok", "sec-ok", 3000),
            search_item("v2", "gone", "sec-gone", 4000),
        ])))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(config.api.profile_path.as_str()))
        .and(query_param("unique_id", "ok"))
        .respond_with(ResponseTemplate::new(200).set_body_json(profile_body(6000, "")))
        .mount(&server)
        .await;

    // Account removed upstream: profile reports a non-200 code, videos list is empty
    Mock::given(method("GET"))
        .and(path(config.api.profile_path.as_str()))
        .and(query_param("unique_id", "gone"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"code": 404, "data": null})))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(config.api.videos_path.as_str()))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"code": 200, "data": {"aweme_list": []}})),
        )
        .mount(&server)
        .await;

    let sleeper = RecordingSleeper::new();
    let pipeline = KeywordPipeline::new(Arc::new(test_client(&config, &sleeper)), &config)
        .with_sleeper(Arc::new(sleeper.clone()));
    let (_tx, rx) = watch::channel(false);

    let report = pipeline.run(RunState::new("AI"), 2, &rx).await.unwrap();

    assert_eq!(report.outcome, KeywordOutcome::Success);
    assert_eq!(report.creators, 2);
    assert_eq!(report.enriched, 1);
    assert_eq!(report.failed, 1);

    let top = &report.artifacts.report.top_creators;
    assert_eq!(top[0].unique_id, "ok");
    assert_eq!(top[0].follower_count, 6000);
    assert_eq!(top[1].unique_id, "gone");
    assert_eq!(top[1].follower_count, 4000);
}

// ============================================================================
// Configuration
// ============================================================================

#[test]
fn test_missing_api_key_fails_validation() {
    let dir = TempDir::new().unwrap();
    let mut config = test_config("http://127.0.0.1:1", dir.path());
    config.api.api_key = "   ".into();

    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("api_key"));
}
