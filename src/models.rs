// Core data structures for the creator-scout crawler

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::storage::dedup::Deduplicator;
use crate::utils::json;

/// Base URL used to build public profile and video links
pub const PROFILE_BASE_URL: &str = "https://www.tiktok.com";

/// Primary deduplication key for a creator
///
/// Derived from the first non-empty of: unique handle, numeric user id, secondary id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdentityKey(String);

impl IdentityKey {
    /// Derive a key from the three candidate identifiers, first non-empty wins
    pub fn derive(unique_id: &str, user_id: &str, sec_uid: &str) -> Option<Self> {
        [unique_id, user_id, sec_uid]
            .into_iter()
            .map(str::trim)
            .find(|s| !s.is_empty())
            .map(|s| Self(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One page of raw search results
#[derive(Debug, Clone, Default)]
pub struct SearchPage {
    pub offset: u32,
    pub page_size: u32,
    pub items: Vec<Value>,
}

impl SearchPage {
    pub fn new(offset: u32, page_size: u32, items: Vec<Value>) -> Self {
        Self {
            offset,
            page_size,
            items,
        }
    }

    /// Video records on this page; items of any other type are ignored
    pub fn videos(&self) -> Vec<VideoRecord> {
        self.items.iter().filter_map(VideoRecord::from_item).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.videos().is_empty()
    }
}

/// A video seen in search results
#[derive(Debug, Clone, PartialEq)]
pub struct VideoRecord {
    /// Platform video id (empty when the payload omitted it)
    pub video_id: String,

    /// Raw author block
    pub author: Value,

    /// Creation timestamp as delivered (seconds or milliseconds)
    pub create_time: i64,

    pub play_count: u64,
}

impl VideoRecord {
    /// Search item type tag for videos
    pub const VIDEO_ITEM_TYPE: i64 = 1;

    /// Build from a search item; `None` unless it is a video item with `aweme_info`
    pub fn from_item(item: &Value) -> Option<Self> {
        if json::i64_at(item, &["type"]) != Some(Self::VIDEO_ITEM_TYPE) {
            return None;
        }
        let info = item.get("aweme_info")?;
        Some(Self::from_aweme(info))
    }

    /// Build from an `aweme_info`-shaped object
    pub fn from_aweme(info: &Value) -> Self {
        Self {
            video_id: json::string_at(info, &["aweme_id"]).unwrap_or_default(),
            author: info.get("author").cloned().unwrap_or(Value::Null),
            create_time: json::i64_at(info, &["create_time"]).unwrap_or(0),
            play_count: json::u64_at(info, &["statistics", "play_count"]).unwrap_or(0),
        }
    }
}

/// A creator admitted from search results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct CreatorCandidate {
    pub identity_key: String,
    pub user_id: String,
    pub sec_uid: String,
    pub unique_id: String,
    pub nickname: String,
    /// Bio text ("signature" upstream)
    pub bio: String,
    pub follower_count: u64,
    pub following_count: u64,
    pub video_count: u64,
    pub like_count: u64,
    pub avatar_url: String,
    pub verified: bool,
    pub profile_url: String,
}

impl CreatorCandidate {
    /// Public profile URL for a handle, empty when the handle is unknown
    pub fn profile_url_for(unique_id: &str) -> String {
        if unique_id.is_empty() {
            String::new()
        } else {
            format!("{PROFILE_BASE_URL}/@{unique_id}")
        }
    }

    /// Display name used in logs
    pub fn label(&self) -> &str {
        if self.nickname.is_empty() {
            &self.identity_key
        } else {
            &self.nickname
        }
    }
}

/// Summary of one of a creator's recent videos
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct RecentVideo {
    pub link: String,
    pub play_count: u64,
    /// Description, cut to a short excerpt
    pub description: String,
    pub create_time: i64,
}

/// Refined counts from the profile-detail lookup
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProfileDetail {
    pub follower_count: Option<u64>,
    pub video_count: Option<u64>,
    pub like_count: Option<u64>,
    pub bio: Option<String>,
    pub verified: Option<bool>,
}

/// Extra fields only the web profile lookup supplies
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WebProfile {
    pub bio_link: Option<String>,
    pub language: Option<String>,
}

/// A candidate plus everything enrichment and scoring derived
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct EnrichedCreator {
    #[serde(flatten)]
    pub candidate: CreatorCandidate,

    /// Up to five most recent videos, newest first
    pub recent_videos: Vec<RecentVideo>,

    pub email: String,
    pub bio_link: String,
    pub language: String,

    /// Whole days since the newest video, -1 when unknown
    pub days_since_last_video: i64,

    pub avg_play_count: f64,
    pub median_play_count: f64,
    pub weighted_views: f64,
    pub engagement_rate: f64,
    pub expected_price: f64,

    /// Whether any detail lookup returned data
    pub enriched: bool,
}

impl EnrichedCreator {
    pub fn follower_count(&self) -> u64 {
        self.candidate.follower_count
    }
}

/// Mutable state of one keyword's search run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunState {
    pub run_id: String,
    pub keyword: String,
    pub dedup: Deduplicator,
    pub collected: Vec<CreatorCandidate>,
    pub offset: u32,
    pub consecutive_empty: u32,
    pub search_count: u64,
    pub started_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RunState {
    /// Fresh state for a keyword
    pub fn new(keyword: &str) -> Self {
        let now = Utc::now();
        Self {
            run_id: uuid::Uuid::new_v4().to_string(),
            keyword: keyword.to_string(),
            dedup: Deduplicator::default(),
            collected: Vec::new(),
            offset: 0,
            consecutive_empty: 0,
            search_count: 0,
            started_at: now,
            updated_at: now,
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Stable sort by follower count, descending, then cut to `target`
    pub fn settle(&mut self, target: usize) {
        self.collected
            .sort_by(|a, b| b.follower_count.cmp(&a.follower_count));
        self.collected.truncate(target);
    }

    pub fn stats(&self) -> RunStats {
        RunStats {
            searches: self.search_count,
            videos_seen: self.dedup.videos_seen(),
            creators_seen: self.dedup.creators_seen(),
            collected: self.collected.len(),
            offset: self.offset,
            duration_secs: (Utc::now() - self.started_at).num_seconds().max(0) as u64,
        }
    }
}

/// Progress counters for a run
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RunStats {
    pub searches: u64,
    pub videos_seen: usize,
    pub creators_seen: usize,
    pub collected: usize,
    pub offset: u32,
    pub duration_secs: u64,
}
