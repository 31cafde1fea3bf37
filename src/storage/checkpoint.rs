//! Checkpoint system for resumable searches
//!
//! A checkpoint is a JSON snapshot of a keyword's full [`RunState`], written
//! every N scan iterations and on interruption. Files are written to a temp
//! path and renamed into place, so a crash mid-write never damages an earlier
//! checkpoint.
//!
//! # Example
//!
//! ```no_run
//! use creator_scout::models::RunState;
//! use creator_scout::storage::checkpoint::CheckpointManager;
//! use std::path::Path;
//!
//! # fn example() -> creator_scout::error::Result<()> {
//! let manager = CheckpointManager::new(Path::new("./output"))?;
//!
//! let state = RunState::new("AI");
//! let path = manager.save_run(&state)?;
//!
//! let restored = manager.load_path(&path)?;
//! println!("Resuming '{}' from offset {}", restored.state.keyword, restored.state.offset);
//! # Ok(())
//! # }
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::Result;
use crate::models::RunState;
use crate::utils::error::StorageError;
use crate::utils::sanitize_filename;

/// File name suffix shared by every checkpoint
pub const CHECKPOINT_SUFFIX: &str = ".checkpoint.json";

/// On-disk checkpoint envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Checkpoint {
    pub keyword: String,
    pub search_count: u64,
    pub collected: usize,
    pub saved_at: DateTime<Utc>,
    pub state: RunState,
}

impl Checkpoint {
    pub fn from_state(state: &RunState) -> Self {
        Self {
            keyword: state.keyword.clone(),
            search_count: state.search_count,
            collected: state.collected.len(),
            saved_at: Utc::now(),
            state: state.clone(),
        }
    }
}

/// Manages checkpoint files for search runs
pub struct CheckpointManager {
    /// Directory for checkpoint files
    checkpoint_dir: PathBuf,

    /// Auto-save interval (in scan iterations)
    auto_save_interval: u64,

    /// Iterations since the counter was last reset
    item_counter: AtomicU64,
}

impl CheckpointManager {
    /// Create a new checkpoint manager, creating the directory if needed
    pub fn new(checkpoint_dir: &Path) -> Result<Self> {
        fs::create_dir_all(checkpoint_dir).map_err(|source| StorageError::Directory {
            path: checkpoint_dir.display().to_string(),
            source,
        })?;

        Ok(Self {
            checkpoint_dir: checkpoint_dir.to_path_buf(),
            auto_save_interval: 100,
            item_counter: AtomicU64::new(0),
        })
    }

    /// Create with custom auto-save interval
    pub fn with_interval(checkpoint_dir: &Path, interval: u64) -> Result<Self> {
        let mut manager = Self::new(checkpoint_dir)?;
        manager.auto_save_interval = interval.max(1);
        Ok(manager)
    }

    /// Checkpoint name for a run: `{keyword}_{search_count}_{timestamp}`
    pub fn name_for(state: &RunState, at: DateTime<Utc>) -> String {
        format!(
            "{}_{}_{}",
            sanitize_filename(&state.keyword),
            state.search_count,
            at.format("%Y%m%d_%H%M%S")
        )
    }

    /// Save any serializable value under `name`
    pub fn save<T: Serialize>(&self, name: &str, value: &T) -> Result<PathBuf> {
        let filename = format!("{name}{CHECKPOINT_SUFFIX}");
        let filepath = self.checkpoint_dir.join(&filename);

        // Write to temp file first, then rename (atomic)
        let temp_path = self.checkpoint_dir.join(format!("{filename}.tmp"));

        let write_err = |source| StorageError::Write {
            path: temp_path.display().to_string(),
            source,
        };

        let file = File::create(&temp_path).map_err(write_err)?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, value)?;

        fs::rename(&temp_path, &filepath).map_err(|source| StorageError::Write {
            path: filepath.display().to_string(),
            source,
        })?;

        tracing::debug!(path = %filepath.display(), "Checkpoint saved");
        Ok(filepath)
    }

    /// Snapshot a run
    pub fn save_run(&self, state: &RunState) -> Result<PathBuf> {
        let checkpoint = Checkpoint::from_state(state);
        let name = Self::name_for(state, checkpoint.saved_at);
        let path = self.save(&name, &checkpoint)?;

        tracing::info!(
            keyword = %state.keyword,
            searches = state.search_count,
            collected = state.collected.len(),
            path = %path.display(),
            "Checkpoint written"
        );
        Ok(path)
    }

    /// Load a checkpoint from an explicit path
    pub fn load_path(&self, path: &Path) -> Result<Checkpoint> {
        let load_err = |reason: String| StorageError::Load {
            path: path.display().to_string(),
            reason,
        };

        let file = File::open(path).map_err(|e| load_err(e.to_string()))?;
        let reader = BufReader::new(file);
        let checkpoint = serde_json::from_reader(reader).map_err(|e| load_err(e.to_string()))?;

        tracing::debug!(path = %path.display(), "Checkpoint loaded");
        Ok(checkpoint)
    }

    /// Increment counter and check if auto-save needed
    pub fn should_auto_save(&self) -> bool {
        let count = self.item_counter.fetch_add(1, Ordering::Relaxed) + 1;
        count % self.auto_save_interval == 0
    }

    /// Reset item counter
    pub fn reset_counter(&self) {
        self.item_counter.store(0, Ordering::Relaxed);
    }
}
