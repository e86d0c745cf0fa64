//! In-memory fakes for the engine's collaborators (testing only)
//!
//! Provides `MemoryRepositoryLog`, `ScriptedRepositoryLog` and
//! `MemoryPullRequests` that satisfy the collaborator contracts without git
//! or network access.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use regex::Regex;

use crate::error::{Result, SnifferError};
use crate::git::RepositoryLog;
use crate::pull_request::{IssueCommentLookup, PullRequest, PullRequestLookup};
use crate::repo::RepoCoordinates;

// ---------------------------------------------------------------------------
// MemoryRepositoryLog
// ---------------------------------------------------------------------------

/// A linear history held in memory, newest commit first.
///
/// `grep` evaluates the patterns with the `regex` crate, so it behaves like
/// `git log -E --all-match --grep=...` for the catalogue's patterns.
#[derive(Debug, Default)]
pub struct MemoryRepositoryLog {
    commits: Vec<(String, String)>,
}

impl MemoryRepositoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a commit on top of the history.
    pub fn commit(mut self, sha: impl Into<String>, message: impl Into<String>) -> Self {
        self.commits.insert(0, (sha.into(), message.into()));
        self
    }
}

impl RepositoryLog for MemoryRepositoryLog {
    fn grep(&self, patterns: &[String], since: Option<&str>) -> Result<Vec<String>> {
        let compiled = patterns
            .iter()
            .map(|p| Regex::new(p).map_err(|e| SnifferError::Git(e.to_string())))
            .collect::<Result<Vec<_>>>()?;

        let range = match since {
            // Unknown revisions behave like a failed `git log`: no matches.
            Some(since) => match self.commits.iter().position(|(sha, _)| sha == since) {
                Some(end) => &self.commits[..end],
                None => return Ok(Vec::new()),
            },
            None => &self.commits[..],
        };

        Ok(range
            .iter()
            .filter(|(_, message)| compiled.iter().all(|re| re.is_match(message)))
            .map(|(sha, _)| sha.clone())
            .collect())
    }

    fn message_of(&self, sha: &str) -> Result<String> {
        self.commits
            .iter()
            .find(|(s, _)| s == sha)
            .map(|(_, message)| message.clone())
            .ok_or_else(|| SnifferError::Git(format!("unknown revision {sha}")))
    }

    fn verify_reference(&self, reference: &str) -> Result<()> {
        if self.commits.iter().any(|(sha, _)| sha == reference) {
            Ok(())
        } else {
            Err(SnifferError::Git(format!("unknown revision '{reference}'")))
        }
    }
}

// ---------------------------------------------------------------------------
// ScriptedRepositoryLog
// ---------------------------------------------------------------------------

/// Answers `grep` calls from a queue of canned responses, in call order, and
/// records the patterns of every call. Once the queue is drained every call
/// returns no matches.
#[derive(Debug, Default)]
pub struct ScriptedRepositoryLog {
    responses: Mutex<VecDeque<Vec<String>>>,
    calls: Mutex<Vec<Vec<String>>>,
}

impl ScriptedRepositoryLog {
    pub fn new(responses: Vec<Vec<String>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Patterns passed to each `grep` call so far.
    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().unwrap().clone()
    }
}

impl RepositoryLog for ScriptedRepositoryLog {
    fn grep(&self, patterns: &[String], _since: Option<&str>) -> Result<Vec<String>> {
        self.calls.lock().unwrap().push(patterns.to_vec());
        Ok(self.responses.lock().unwrap().pop_front().unwrap_or_default())
    }

    fn message_of(&self, sha: &str) -> Result<String> {
        Err(SnifferError::Git(format!("no message scripted for {sha}")))
    }

    fn verify_reference(&self, _reference: &str) -> Result<()> {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// MemoryPullRequests
// ---------------------------------------------------------------------------

/// Pull requests and issue comments keyed by commit sha and comment id.
#[derive(Debug, Default)]
pub struct MemoryPullRequests {
    by_commit: HashMap<String, PullRequest>,
    comments: HashMap<String, String>,
    failing: Vec<String>,
    requests: Mutex<Vec<String>>,
}

impl MemoryPullRequests {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pull_request(mut self, sha: impl Into<String>, pr: PullRequest) -> Self {
        self.by_commit.insert(sha.into(), pr);
        self
    }

    pub fn with_comment(mut self, id: impl Into<String>, body: impl Into<String>) -> Self {
        self.comments.insert(id.into(), body.into());
        self
    }

    /// Make lookups for `sha` fail as a network error would.
    pub fn failing_for(mut self, sha: impl Into<String>) -> Self {
        self.failing.push(sha.into());
        self
    }

    /// Commit shas looked up so far, in request order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl PullRequestLookup for MemoryPullRequests {
    async fn find(&self, sha: &str, _repo: &RepoCoordinates) -> Result<Option<PullRequest>> {
        self.requests.lock().unwrap().push(sha.to_string());
        if self.failing.iter().any(|s| s == sha) {
            return Err(SnifferError::Lookup(format!("lookup for {sha} failed")));
        }
        Ok(self.by_commit.get(sha).cloned())
    }
}

#[async_trait]
impl IssueCommentLookup for MemoryPullRequests {
    async fn fetch(&self, _repo: &RepoCoordinates, comment_id: &str) -> Result<Option<String>> {
        Ok(self.comments.get(comment_id).cloned())
    }
}
