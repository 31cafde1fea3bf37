//! Final artifacts: ranked creator table and summary report
//!
//! Each export is numbered by scanning prior artifact names for the highest
//! sequence number. The allocator itself is a pure function over names, so it
//! can be tested without touching the filesystem.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::error::Result;
use crate::models::EnrichedCreator;
use crate::scoring::is_active;
use crate::utils::error::StorageError;
use crate::utils::{escape_csv, sanitize_filename};

/// Byte order mark so spreadsheet tools detect UTF-8
const UTF8_BOM: &str = "\u{feff}";

/// Recent videos listed per creator in the table
const CSV_VIDEO_COLUMNS: usize = 5;

const CSV_COLUMNS: &[&str] = &[
    "search_keyword",
    "nickname",
    "unique_id",
    "follower_count",
    "total_video_count",
    "total_likes_count",
    "avg_video_play_count",
    "median_view_count",
    "expected_price",
    "days_since_last_video",
    "account_url",
    "bio",
    "email",
    "bio_link_url",
    "language",
];

// ============================================================================
// Sequence allocation
// ============================================================================

/// Source of previously written artifact names
pub trait ArtifactListing {
    fn artifact_names(&self) -> Result<Vec<String>>;
}

/// Lists file names in a directory; a missing directory lists as empty
pub struct DirListing<'a>(pub &'a Path);

impl ArtifactListing for DirListing<'_> {
    fn artifact_names(&self) -> Result<Vec<String>> {
        if !self.0.exists() {
            return Ok(Vec::new());
        }

        let entries = fs::read_dir(self.0).map_err(|source| StorageError::Directory {
            path: self.0.display().to_string(),
            source,
        })?;

        Ok(entries
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| entry.file_name().to_str().map(str::to_string))
            .collect())
    }
}

/// Sequence number of an export artifact name, if it is one
fn sequence_of(name: &str) -> Option<u32> {
    if !(name.ends_with(".csv") || name.ends_with("_report.json")) {
        return None;
    }
    name.split('_').next()?.parse().ok()
}

/// Next sequence number: one past the highest in `names`, or 1
pub fn next_sequence<S: AsRef<str>>(names: &[S]) -> u32 {
    names
        .iter()
        .filter_map(|n| sequence_of(n.as_ref()))
        .max()
        .map_or(1, |max| max.saturating_add(1))
}

/// `{seq:02}_{keyword}_{YYYYmmdd_HHMMSS}`
pub fn artifact_prefix(sequence: u32, keyword: &str, at: DateTime<Utc>) -> String {
    format!(
        "{sequence:02}_{}_{}",
        sanitize_filename(keyword),
        at.format("%Y%m%d_%H%M%S")
    )
}

// ============================================================================
// Report
// ============================================================================

/// Entry in the report's top list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopCreator {
    pub nickname: String,
    pub unique_id: String,
    pub follower_count: u64,
}

/// JSON summary written next to the creator table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryReport {
    pub keyword: String,
    pub collection_time: String,
    pub videos_scanned: usize,
    pub total_creators: usize,
    pub total_followers: u64,
    pub avg_followers: f64,
    pub total_videos: u64,
    pub total_likes: u64,
    pub avg_play_count: f64,
    pub email_count: usize,
    pub active_creators: usize,
    pub top_creators: Vec<TopCreator>,
}

/// Sum of upstream counts, pinned at `u64::MAX` instead of overflowing
fn saturating_total(creators: &[EnrichedCreator], count: impl Fn(&EnrichedCreator) -> u64) -> u64 {
    creators.iter().map(count).fold(0, u64::saturating_add)
}

impl SummaryReport {
    /// Aggregate a result set; an empty set yields zeros
    pub fn build(
        keyword: &str,
        creators: &[EnrichedCreator],
        videos_scanned: usize,
        at: DateTime<Utc>,
        top_n: usize,
        active_days: i64,
    ) -> Self {
        let total_creators = creators.len();
        let total_followers = saturating_total(creators, |c| c.candidate.follower_count);
        let per_creator = |total: f64| {
            if total_creators == 0 {
                0.0
            } else {
                total / total_creators as f64
            }
        };

        let mut ranked: Vec<&EnrichedCreator> = creators.iter().collect();
        ranked.sort_by(|a, b| b.candidate.follower_count.cmp(&a.candidate.follower_count));

        Self {
            keyword: keyword.to_string(),
            collection_time: at.to_rfc3339(),
            videos_scanned,
            total_creators,
            total_followers,
            avg_followers: per_creator(total_followers as f64),
            total_videos: saturating_total(creators, |c| c.candidate.video_count),
            total_likes: saturating_total(creators, |c| c.candidate.like_count),
            avg_play_count: per_creator(creators.iter().map(|c| c.avg_play_count).sum()),
            email_count: creators.iter().filter(|c| !c.email.is_empty()).count(),
            active_creators: creators
                .iter()
                .filter(|c| is_active(c.days_since_last_video, active_days))
                .count(),
            top_creators: ranked
                .into_iter()
                .take(top_n)
                .map(|c| TopCreator {
                    nickname: c.candidate.nickname.clone(),
                    unique_id: c.candidate.unique_id.clone(),
                    follower_count: c.candidate.follower_count,
                })
                .collect(),
        }
    }
}

// ============================================================================
// CSV
// ============================================================================

/// Render the creator table, BOM included
pub fn render_csv(keyword: &str, creators: &[EnrichedCreator]) -> String {
    let mut header: Vec<String> = CSV_COLUMNS.iter().map(|c| c.to_string()).collect();
    for k in 1..=CSV_VIDEO_COLUMNS {
        header.push(format!("video_{k}_link"));
        header.push(format!("video_{k}_play_count"));
    }

    let mut csv = String::from(UTF8_BOM);
    csv.push_str(&header.join(","));
    csv.push('\n');

    for creator in creators {
        let c = &creator.candidate;
        let mut row = vec![
            escape_csv(keyword),
            escape_csv(&c.nickname),
            escape_csv(&c.unique_id),
            c.follower_count.to_string(),
            c.video_count.to_string(),
            c.like_count.to_string(),
            format!("{:.2}", creator.avg_play_count),
            format!("{:.2}", creator.median_play_count),
            format!("{:.2}", creator.expected_price),
            creator.days_since_last_video.to_string(),
            escape_csv(&c.profile_url),
            escape_csv(&c.bio),
            escape_csv(&creator.email),
            escape_csv(&creator.bio_link),
            escape_csv(&creator.language),
        ];

        for k in 0..CSV_VIDEO_COLUMNS {
            match creator.recent_videos.get(k) {
                Some(video) => {
                    row.push(escape_csv(&video.link));
                    row.push(video.play_count.to_string());
                }
                None => {
                    row.push(String::new());
                    row.push(String::new());
                }
            }
        }

        csv.push_str(&row.join(","));
        csv.push('\n');
    }

    csv
}

// ============================================================================
// Exporter
// ============================================================================

/// Paths and content of one export
#[derive(Debug, Clone)]
pub struct ExportArtifacts {
    pub sequence: u32,
    pub csv_path: Option<PathBuf>,
    pub report_path: PathBuf,
    pub report: SummaryReport,
}

/// Writes the final table and report into the output directory
pub struct Exporter {
    dir: PathBuf,
    write_csv: bool,
    top_n: usize,
    active_days: i64,
}

impl Exporter {
    pub fn new(config: &Config) -> Self {
        Self {
            dir: config.output.dir.clone(),
            write_csv: config.output.write_csv,
            top_n: config.scoring.top_n,
            active_days: config.scoring.active_days,
        }
    }

    /// Override the output directory
    #[must_use]
    pub fn with_dir(mut self, dir: &Path) -> Self {
        self.dir = dir.to_path_buf();
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write artifacts for one keyword's results
    pub fn export(
        &self,
        keyword: &str,
        creators: &[EnrichedCreator],
        videos_scanned: usize,
        at: DateTime<Utc>,
    ) -> Result<ExportArtifacts> {
        fs::create_dir_all(&self.dir).map_err(|source| StorageError::Directory {
            path: self.dir.display().to_string(),
            source,
        })?;

        let sequence = next_sequence(&DirListing(&self.dir).artifact_names()?);
        let prefix = artifact_prefix(sequence, keyword, at);

        let csv_path = if self.write_csv {
            let path = self.dir.join(format!("{prefix}.csv"));
            write_file(&path, render_csv(keyword, creators).as_bytes())?;
            Some(path)
        } else {
            None
        };

        let report = SummaryReport::build(
            keyword,
            creators,
            videos_scanned,
            at,
            self.top_n,
            self.active_days,
        );
        let report_path = self.dir.join(format!("{prefix}_report.json"));
        write_file(&report_path, serde_json::to_string_pretty(&report)?.as_bytes())?;

        tracing::info!(
            keyword = keyword,
            sequence = sequence,
            creators = creators.len(),
            report = %report_path.display(),
            "Export written"
        );

        Ok(ExportArtifacts {
            sequence,
            csv_path,
            report_path,
            report,
        })
    }
}

fn write_file(path: &Path, contents: &[u8]) -> Result<()> {
    fs::write(path, contents).map_err(|source| StorageError::Write {
        path: path.display().to_string(),
        source,
    })?;
    Ok(())
}
