//! Error types for the creator-scout crawler
//!
//! This module defines custom error types used throughout the application.

use thiserror::Error;

/// Errors that can occur during HTTP fetching operations
#[derive(Error, Debug)]
pub enum FetchError {
    /// HTTP request error
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success status code
    #[error("Unexpected status: {0}")]
    Status(u16),

    /// Request timeout
    #[error("Request timeout")]
    Timeout,

    /// All attempts used up; callers treat this as "no data this round"
    #[error("Retries exhausted for {endpoint}: {last}")]
    Exhausted {
        /// Endpoint path that was requested
        endpoint: String,
        /// Last status code or transport error observed
        last: String,
    },

    /// Response body was not valid JSON
    #[error("Decoding error: {0}")]
    Decode(String),

    /// Invalid URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl FetchError {
    /// Short description of the failure, used when recording the last error of a retry loop
    pub fn summary(&self) -> String {
        match self {
            Self::Status(code) => format!("status {code}"),
            Self::Timeout => "timeout".to_string(),
            Self::Http(e) => format!("transport: {e}"),
            other => other.to_string(),
        }
    }
}

/// Errors raised while writing run artifacts
#[derive(Error, Debug)]
pub enum StorageError {
    /// Output directory could not be created or listed
    #[error("Output directory error at {path}: {source}")]
    Directory {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Artifact could not be written
    #[error("Failed to write {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Checkpoint could not be read back
    #[error("Failed to load checkpoint {path}: {reason}")]
    Load { path: String, reason: String },
}
