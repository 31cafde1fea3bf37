pub mod search;

// Re-export command functions for convenience
pub use search::{resume, search, RunOptions};

use creator_scout::crawler::KeywordReport;
use std::process::ExitCode;

/// 0 when any keyword exported creators, 2 when every keyword came back empty
pub fn exit_code(reports: &[KeywordReport]) -> ExitCode {
    if reports.iter().any(|r| r.creators > 0) {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(2)
    }
}
