//! GitHub lookups for Regression Sniffer
//!
//! Implements the core's [`PullRequestLookup`](sniffer_core::PullRequestLookup)
//! and [`IssueCommentLookup`](sniffer_core::IssueCommentLookup) against the
//! GitHub REST API.

pub mod client;
pub mod error;

pub use client::{GitHubClient, GitHubConfig, DEFAULT_API_URL};
pub use error::GitHubError;

/// Result type for GitHub operations
pub type Result<T> = std::result::Result<T, GitHubError>;
