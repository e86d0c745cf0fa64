//! Error types for sniffer-github

use sniffer_core::SnifferError;
use thiserror::Error;

/// Errors that can occur while talking to the GitHub REST API
#[derive(Error, Debug)]
pub enum GitHubError {
    /// Transport-level failure (connect, TLS, timeout)
    #[error("HTTP error: {0}")]
    Http(String),

    /// The API answered with a non-success status
    #[error("GitHub API returned {status} for {url}")]
    Status { status: u16, url: String },

    /// Response body was not the expected JSON
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    /// Comment ids are decimal numbers
    #[error("invalid comment id: {0}")]
    InvalidCommentId(String),
}

impl GitHubError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, GitHubError::Status { status: 404, .. })
    }
}

impl From<reqwest::Error> for GitHubError {
    fn from(err: reqwest::Error) -> Self {
        GitHubError::Http(err.to_string())
    }
}

impl From<GitHubError> for SnifferError {
    fn from(err: GitHubError) -> Self {
        SnifferError::Lookup(err.to_string())
    }
}
