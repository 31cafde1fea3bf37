//! Run-scoped deduplication of videos and creators
//!
//! Membership is append-only: ids are inserted, never removed, for the life of
//! one keyword run. Sets are ordered so checkpoints serialize deterministically.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::models::{IdentityKey, VideoRecord};

/// Result of filtering one page of videos
#[derive(Debug, Clone, Default)]
pub struct DedupCheckResult {
    /// Videos seen for the first time, in page order
    pub new_videos: Vec<VideoRecord>,

    /// Videos already seen earlier in the run
    pub duplicates: usize,

    /// Videos without an id, which cannot be tracked
    pub missing_id: usize,
}

impl DedupCheckResult {
    pub fn new_count(&self) -> usize {
        self.new_videos.len()
    }
}

/// Seen-video and seen-creator sets for one run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Deduplicator {
    seen_videos: BTreeSet<String>,
    seen_creators: BTreeSet<IdentityKey>,
}

impl Deduplicator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_video(&self, video_id: &str) -> bool {
        self.seen_videos.contains(video_id)
    }

    /// Record a video id; returns `true` if it was not seen before
    pub fn insert_video(&mut self, video_id: &str) -> bool {
        if self.seen_videos.contains(video_id) {
            return false;
        }
        self.seen_videos.insert(video_id.to_string())
    }

    pub fn has_creator(&self, key: &IdentityKey) -> bool {
        self.seen_creators.contains(key)
    }

    /// Record a creator key; returns `true` if it was not seen before
    pub fn insert_creator(&mut self, key: IdentityKey) -> bool {
        self.seen_creators.insert(key)
    }

    /// Keep the videos of a page whose ids are new, recording them as seen
    ///
    /// A video repeated within the same page counts as a duplicate on its second
    /// occurrence.
    pub fn filter_videos(&mut self, videos: Vec<VideoRecord>) -> DedupCheckResult {
        let mut result = DedupCheckResult::default();

        for video in videos {
            if video.video_id.is_empty() {
                result.missing_id += 1;
            } else if self.insert_video(&video.video_id) {
                result.new_videos.push(video);
            } else {
                result.duplicates += 1;
            }
        }

        result
    }

    pub fn videos_seen(&self) -> usize {
        self.seen_videos.len()
    }

    pub fn creators_seen(&self) -> usize {
        self.seen_creators.len()
    }
}
