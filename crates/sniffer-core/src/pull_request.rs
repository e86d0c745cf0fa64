//! Pull-request collaborators used to enrich reportable commits.
//!
//! The engine only needs two lookups: the pull request a downstream commit
//! arrived through, and the body of an issue comment. Both are async because
//! they cross a network boundary; implementations live outside this crate.

use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::repo::RepoCoordinates;

/// Label a maintainer sets when the detected follow-ups need no backport.
pub const WAIVER_LABEL: &str = "follow-up-waived";

const COMMENT_MARKER: &str = r#"<!-- issue-commentator = \{.*"comment-id":"(\d+)".*\} -->"#;

static COMMENT_MARKER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(COMMENT_MARKER).expect("comment marker is a valid regex"));

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    pub name: String,
}

/// The subset of pull-request data the engine inspects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequest {
    pub number: u64,
    #[serde(default)]
    pub html_url: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub labels: Vec<Label>,
}

impl PullRequest {
    pub fn has_waiver_label(&self) -> bool {
        self.labels.iter().any(|label| label.name == WAIVER_LABEL)
    }

    /// Id of the review comment linked from the body's machine marker.
    pub fn comment_marker_id(&self) -> Option<String> {
        let body = self.body.as_deref()?;
        COMMENT_MARKER_RE
            .captures(body)
            .map(|captures| captures[1].to_string())
    }
}

/// Finds the pull request that introduced a commit.
#[async_trait]
pub trait PullRequestLookup: Send + Sync {
    /// `Ok(None)` when the commit has no associated pull request.
    async fn find(&self, sha: &str, repo: &RepoCoordinates) -> Result<Option<PullRequest>>;
}

/// Fetches issue-comment bodies by id.
#[async_trait]
pub trait IssueCommentLookup: Send + Sync {
    async fn fetch(&self, repo: &RepoCoordinates, comment_id: &str) -> Result<Option<String>>;
}
