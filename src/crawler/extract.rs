//! Creator extraction and admission from search-result author blocks

use serde_json::Value;
use tracing::debug;

use crate::metrics::{self, Admission};
use crate::models::{CreatorCandidate, IdentityKey, VideoRecord};
use crate::storage::dedup::Deduplicator;
use crate::utils::json;

/// Outcome counts for one page of extraction
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractionResult {
    /// Creators admitted, in the order their videos appeared
    pub admitted: Vec<CreatorCandidate>,
    pub duplicates: usize,
    pub below_threshold: usize,
    pub no_identity: usize,
}

/// Turns author blocks into creator candidates, gated by a follower threshold
#[derive(Debug, Clone)]
pub struct CreatorExtractor {
    min_followers: u64,
}

impl CreatorExtractor {
    pub fn new(min_followers: u64) -> Self {
        Self { min_followers }
    }

    /// Normalize an author block; `None` when the block is empty or carries no identity
    pub fn candidate_from_author(author: &Value) -> Option<CreatorCandidate> {
        Self::parse_author(author).map(|(_, candidate)| candidate)
    }

    fn parse_author(author: &Value) -> Option<(IdentityKey, CreatorCandidate)> {
        let author = json::non_empty_object(author, &[])?;

        let unique_id = json::string_at(author, &["unique_id"]).unwrap_or_default();
        let user_id = json::string_at(author, &["uid"]).unwrap_or_default();
        let sec_uid = json::string_at(author, &["sec_uid"]).unwrap_or_default();
        let key = IdentityKey::derive(&unique_id, &user_id, &sec_uid)?;

        let avatar_url = json::array_at(author, &["avatar_larger", "url_list"])
            .first()
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        let candidate = CreatorCandidate {
            identity_key: key.to_string(),
            profile_url: CreatorCandidate::profile_url_for(&unique_id),
            nickname: json::string_at(author, &["nickname"]).unwrap_or_default(),
            bio: json::string_at(author, &["signature"]).unwrap_or_default(),
            follower_count: json::u64_at(author, &["follower_count"]).unwrap_or(0),
            following_count: json::u64_at(author, &["following_count"]).unwrap_or(0),
            video_count: json::u64_at(author, &["aweme_count"]).unwrap_or(0),
            like_count: json::u64_at(author, &["total_favorited"]).unwrap_or(0),
            verified: json::i64_at(author, &["verification_type"]).is_some_and(|v| v > 0),
            avatar_url,
            user_id,
            sec_uid,
            unique_id,
        };
        Some((key, candidate))
    }

    /// Decide admission for one author block
    ///
    /// The key is marked seen only on admission, so a creator rejected for a low
    /// follower count can still be admitted from a later video.
    pub fn admit(
        &self,
        author: &Value,
        dedup: &mut Deduplicator,
    ) -> Result<CreatorCandidate, Admission> {
        let (key, candidate) = Self::parse_author(author).ok_or(Admission::NoIdentity)?;

        if dedup.has_creator(&key) {
            return Err(Admission::Duplicate);
        }
        if candidate.follower_count < self.min_followers {
            return Err(Admission::BelowThreshold);
        }

        dedup.insert_creator(key);
        Ok(candidate)
    }

    /// Extract every admissible creator from a page of new videos
    pub fn extract(&self, videos: &[VideoRecord], dedup: &mut Deduplicator) -> ExtractionResult {
        let mut result = ExtractionResult::default();

        for video in videos {
            match self.admit(&video.author, dedup) {
                Ok(candidate) => {
                    debug!(
                        creator = candidate.label(),
                        followers = candidate.follower_count,
                        "Admitted creator"
                    );
                    metrics::record_admission(Admission::Admitted);
                    result.admitted.push(candidate);
                }
                Err(reason) => {
                    metrics::record_admission(reason);
                    match reason {
                        Admission::Duplicate => result.duplicates += 1,
                        Admission::BelowThreshold => result.below_threshold += 1,
                        Admission::NoIdentity | Admission::Admitted => result.no_identity += 1,
                    }
                }
            }
        }

        result
    }
}

impl Default for CreatorExtractor {
    fn default() -> Self {
        Self::new(1000)
    }
}
