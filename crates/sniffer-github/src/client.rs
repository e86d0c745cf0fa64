//! GitHub REST client
//!
//! Resolves the pull request a downstream commit was merged through and
//! fetches issue-comment bodies referenced from pull-request descriptions.

use crate::error::GitHubError;
use crate::Result;
use async_trait::async_trait;
use reqwest::header::ACCEPT;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sniffer_core::config::{API_URL_VAR, TOKEN_VAR};
use sniffer_core::{IssueCommentLookup, PullRequest, PullRequestLookup, RepoCoordinates};
use tracing::{debug, warn};

pub const DEFAULT_API_URL: &str = "https://api.github.com";
const API_VERSION: &str = "2022-11-28";

/// GitHub API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubConfig {
    /// API base URL, without trailing slash
    pub api_url: String,
    /// Personal access token (optional for public data, subject to rate limits)
    pub token: Option<String>,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        GitHubConfig {
            api_url: std::env::var(API_URL_VAR)
                .ok()
                .filter(|url| !url.is_empty())
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            token: std::env::var(TOKEN_VAR).ok().filter(|t| !t.is_empty()),
        }
    }
}

impl GitHubConfig {
    /// Create a new config from environment variables
    pub fn from_env() -> Self {
        Self::default()
    }

    /// Create config for a specific API endpoint
    pub fn new(api_url: &str) -> Self {
        GitHubConfig {
            api_url: api_url.trim_end_matches('/').to_string(),
            token: None,
        }
    }

    /// Set authentication token
    pub fn with_token(mut self, token: &str) -> Self {
        self.token = Some(token.to_string());
        self
    }
}

#[derive(Debug, Deserialize)]
struct IssueComment {
    #[serde(default)]
    body: Option<String>,
}

/// GitHub client for pull-request and comment lookups
pub struct GitHubClient {
    config: GitHubConfig,
    http_client: reqwest::Client,
}

impl GitHubClient {
    pub fn new(config: GitHubConfig) -> Self {
        let http_client = reqwest::Client::builder()
            .user_agent(concat!("regression-sniffer/", env!("CARGO_PKG_VERSION")))
            .build()
            .expect("Failed to create HTTP client");

        GitHubClient {
            config,
            http_client,
        }
    }

    /// Create client from environment variables
    pub fn from_env() -> Self {
        Self::new(GitHubConfig::from_env())
    }

    pub fn config(&self) -> &GitHubConfig {
        &self.config
    }

    /// `GET /repos/{owner}/{repo}/commits/{sha}/pulls`
    pub fn commit_pulls_url(&self, repo: &RepoCoordinates, sha: &str) -> String {
        format!(
            "{}/repos/{}/{}/commits/{}/pulls",
            self.config.api_url, repo.owner, repo.repo, sha
        )
    }

    /// `GET /repos/{owner}/{repo}/issues/comments/{id}`
    pub fn issue_comment_url(&self, repo: &RepoCoordinates, comment_id: &str) -> String {
        format!(
            "{}/repos/{}/{}/issues/comments/{}",
            self.config.api_url, repo.owner, repo.repo, comment_id
        )
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let mut request = self
            .http_client
            .get(url)
            .header(ACCEPT, "application/vnd.github+json")
            .header("X-GitHub-Api-Version", API_VERSION);
        if let Some(token) = &self.config.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(GitHubError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// First pull request associated with `sha`, if any.
    pub async fn pull_request_for_commit(
        &self,
        repo: &RepoCoordinates,
        sha: &str,
    ) -> Result<Option<PullRequest>> {
        let url = self.commit_pulls_url(repo, sha);
        debug!(%url, "fetching pull requests for commit");
        let pulls: Vec<PullRequest> = self.get_json(&url).await?;
        Ok(pulls.into_iter().next())
    }

    /// Body of an issue comment. `None` when the comment has no body.
    pub async fn issue_comment(
        &self,
        repo: &RepoCoordinates,
        comment_id: &str,
    ) -> Result<Option<String>> {
        if comment_id.is_empty() || !comment_id.bytes().all(|b| b.is_ascii_digit()) {
            return Err(GitHubError::InvalidCommentId(comment_id.to_string()));
        }
        let url = self.issue_comment_url(repo, comment_id);
        debug!(%url, "fetching issue comment");
        let comment: IssueComment = self.get_json(&url).await?;
        Ok(comment.body)
    }
}

#[async_trait]
impl PullRequestLookup for GitHubClient {
    async fn find(
        &self,
        sha: &str,
        repo: &RepoCoordinates,
    ) -> sniffer_core::Result<Option<PullRequest>> {
        match self.pull_request_for_commit(repo, sha).await {
            Ok(pr) => Ok(pr),
            Err(e) => {
                // Failed lookups count as "no pull request".
                warn!(sha, repo = %repo, "pull request lookup failed: {e}");
                Ok(None)
            }
        }
    }
}

#[async_trait]
impl IssueCommentLookup for GitHubClient {
    async fn fetch(
        &self,
        repo: &RepoCoordinates,
        comment_id: &str,
    ) -> sniffer_core::Result<Option<String>> {
        match self.issue_comment(repo, comment_id).await {
            Ok(body) => Ok(body),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
