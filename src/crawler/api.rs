//! Typed access to the search, profile and video endpoints
//!
//! [`CreatorSource`] is the seam between the pipeline and the upstream API. Every
//! method reports "no data" as an empty value instead of an error, so one failed
//! page or lookup never aborts a run.

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::{ApiConfig, Config};
use crate::crawler::fetcher::RateLimitedFetcher;
use crate::models::{ProfileDetail, RecentVideo, SearchPage, WebProfile, PROFILE_BASE_URL};
use crate::utils::{json, normalize_whitespace, truncate_text};

/// Status code the API reports inside successful bodies
const API_OK: i64 = 200;

/// Characters kept from a video description
const DESCRIPTION_EXCERPT_CHARS: usize = 100;

/// Source of search pages and per-creator details
#[async_trait]
pub trait CreatorSource: Send + Sync {
    /// One page of search results; empty when the request failed
    async fn search_page(&self, keyword: &str, offset: u32, count: u32) -> SearchPage;

    /// Profile detail by handle or secondary id
    async fn user_profile(&self, unique_id: &str, sec_uid: &str) -> Option<ProfileDetail>;

    /// Web profile, the only source of bio link and language tag
    async fn web_profile(&self, unique_id: &str, sec_uid: &str) -> Option<WebProfile>;

    /// Up to `count` of the creator's videos, in upstream order
    async fn user_videos(&self, sec_uid: &str, count: u32) -> Vec<RecentVideo>;
}

/// `CreatorSource` backed by the TikHub HTTP API
pub struct TikHubClient {
    fetcher: RateLimitedFetcher,
    api: ApiConfig,
    sort_type: u32,
    publish_time: u32,
}

impl TikHubClient {
    pub fn new(fetcher: RateLimitedFetcher, config: &Config) -> Self {
        Self {
            fetcher,
            api: config.api.clone(),
            sort_type: config.scan.sort_type,
            publish_time: config.scan.publish_time,
        }
    }

    /// Fetch and return the body, or `None` after logging the failure
    async fn get(&self, endpoint: &str, params: &[(&str, String)]) -> Option<Value> {
        match self.fetcher.fetch(endpoint, params).await {
            Ok(body) => Some(body),
            Err(e) => {
                warn!(endpoint = endpoint, error = %e, "Request returned no data");
                None
            }
        }
    }

    /// Identity parameters for profile lookups; the handle is preferred
    fn identity_params(
        handle_key: &'static str,
        unique_id: &str,
        sec_key: &'static str,
        sec_uid: &str,
    ) -> Option<Vec<(&'static str, String)>> {
        if !unique_id.is_empty() {
            Some(vec![(handle_key, unique_id.to_string())])
        } else if !sec_uid.is_empty() {
            Some(vec![(sec_key, sec_uid.to_string())])
        } else {
            None
        }
    }
}

/// `data` of a body whose `code` is 200
fn ok_data(body: &Value) -> Option<&Value> {
    if json::i64_at(body, &["code"]) != Some(API_OK) {
        debug!(code = ?body.get("code"), "Unexpected response code");
        return None;
    }
    body.get("data")
}

/// Parse the app profile response
pub fn parse_profile(body: &Value) -> Option<ProfileDetail> {
    let user = json::non_empty_object(ok_data(body)?, &["user"])?;

    Some(ProfileDetail {
        follower_count: json::u64_at(user, &["follower_count"]),
        video_count: json::u64_at(user, &["aweme_count"]),
        like_count: json::u64_at(user, &["total_favorited"]),
        bio: user
            .get("signature")
            .and_then(Value::as_str)
            .map(str::to_string),
        verified: json::i64_at(user, &["verification_type"]).map(|v| v > 0),
    })
}

/// Parse the web profile response; `data` may arrive as an encoded JSON string
pub fn parse_web_profile(body: &Value) -> Option<WebProfile> {
    let data = ok_data(body)?;
    let decoded;
    let data = match data {
        Value::String(text) => {
            decoded = serde_json::from_str::<Value>(text).ok()?;
            &decoded
        }
        other => other,
    };

    let user = json::non_empty_object(data, &["userInfo", "user"])?;

    Some(WebProfile {
        bio_link: json::string_at(user, &["bioLink", "link"]),
        language: json::string_at(user, &["language"]),
    })
}

/// Parse the user videos response
pub fn parse_videos(body: &Value) -> Vec<RecentVideo> {
    let Some(data) = ok_data(body) else {
        return Vec::new();
    };

    json::array_at(data, &["aweme_list"])
        .iter()
        .filter_map(|aweme| {
            let id = json::string_at(aweme, &["aweme_id"])?;
            let handle = json::string_at(aweme, &["author", "unique_id"])
                .unwrap_or_else(|| "unknown".to_string());
            let desc = aweme.get("desc").and_then(Value::as_str).unwrap_or_default();

            Some(RecentVideo {
                link: format!("{PROFILE_BASE_URL}/@{handle}/video/{id}"),
                play_count: json::u64_at(aweme, &["statistics", "play_count"]).unwrap_or(0),
                description: truncate_text(&normalize_whitespace(desc), DESCRIPTION_EXCERPT_CHARS),
                create_time: json::i64_at(aweme, &["create_time"]).unwrap_or(0),
            })
        })
        .collect()
}

#[async_trait]
impl CreatorSource for TikHubClient {
    async fn search_page(&self, keyword: &str, offset: u32, count: u32) -> SearchPage {
        let params = [
            ("keyword", keyword.to_string()),
            ("offset", offset.to_string()),
            ("count", count.to_string()),
            ("sort_type", self.sort_type.to_string()),
            ("publish_time", self.publish_time.to_string()),
        ];

        let items = match self.get(&self.api.search_path, &params).await {
            Some(body) => json::array_at(&body, &["data", "data"]).to_vec(),
            None => Vec::new(),
        };

        SearchPage::new(offset, count, items)
    }

    async fn user_profile(&self, unique_id: &str, sec_uid: &str) -> Option<ProfileDetail> {
        let params = Self::identity_params("unique_id", unique_id, "sec_user_id", sec_uid)?;
        let body = self.get(&self.api.profile_path, &params).await?;
        parse_profile(&body)
    }

    async fn web_profile(&self, unique_id: &str, sec_uid: &str) -> Option<WebProfile> {
        let params = Self::identity_params("uniqueId", unique_id, "secUid", sec_uid)?;
        let body = self.get(&self.api.web_profile_path, &params).await?;
        parse_web_profile(&body)
    }

    async fn user_videos(&self, sec_uid: &str, count: u32) -> Vec<RecentVideo> {
        if sec_uid.is_empty() {
            return Vec::new();
        }
        let params = [
            ("sec_user_id", sec_uid.to_string()),
            ("max_cursor", "0".to_string()),
            ("count", count.to_string()),
        ];

        match self.get(&self.api.videos_path, &params).await {
            Some(body) => parse_videos(&body),
            None => Vec::new(),
        }
    }
}
