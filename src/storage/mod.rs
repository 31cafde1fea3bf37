//! Run state persistence and result export
//!
//! Seen-set bookkeeping, JSON checkpoints for resumable runs, and the CSV and
//! report files written at the end of each keyword.

pub mod checkpoint;
pub mod dedup;
pub mod export;

pub use checkpoint::{Checkpoint, CheckpointManager};
pub use dedup::{DedupCheckResult, Deduplicator};
pub use export::{ExportArtifacts, Exporter, SummaryReport};
