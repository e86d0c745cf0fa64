//! The downstream commit stream and its backport discovery.
//!
//! A [`BackportStream`] is built empty, populated by
//! [`BackportStream::discover_backports`], then cross-referenced once by
//! [`BackportStream::resolve`].

use std::fmt;

use tracing::info;

use crate::commit::CommitRecord;
use crate::error::Result;
use crate::git::RepositoryLog;
use crate::patterns::PatternSet;
use crate::repo::RepoCoordinates;
use crate::resolver::RelationResolver;

/// Outcome of the discovery step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Discovery {
    /// No downstream commit carries a cherry-pick marker.
    NoBackports,
    /// This many backport commits were recorded.
    Found(usize),
}

impl fmt::Display for Discovery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Discovery::NoBackports => write!(f, "No backported commits found."),
            Discovery::Found(n) => write!(f, "Found {n} backported commits."),
        }
    }
}

/// Downstream commits since a reference point, with their relations.
#[derive(Debug, Clone)]
pub struct BackportStream {
    repo: RepoCoordinates,
    since: Option<String>,
    backported_commits: Vec<String>,
    commits: Vec<CommitRecord>,
}

impl BackportStream {
    pub fn new(repo: RepoCoordinates) -> Self {
        Self {
            repo,
            since: None,
            backported_commits: Vec::new(),
            commits: Vec::new(),
        }
    }

    /// Find every downstream commit with a cherry-pick marker after `since`
    /// and build a [`CommitRecord`] for each, in history order.
    ///
    /// Relations are looked up in `upstream`. Replaces the result of any
    /// earlier discovery. A `since` that does not name a downstream commit,
    /// or any other repository-log error, aborts the whole step.
    pub fn discover_backports(
        &mut self,
        downstream: &dyn RepositoryLog,
        upstream: &dyn RepositoryLog,
        patterns: &PatternSet,
        since: Option<&str>,
    ) -> Result<Discovery> {
        self.since = since.map(str::to_string);
        self.commits.clear();
        self.backported_commits.clear();
        if let Some(since) = since {
            downstream.verify_reference(since)?;
        }
        self.backported_commits = downstream.grep(&patterns.backport_query(), since)?;

        if self.backported_commits.is_empty() {
            info!(repo = %self.repo, ?since, "no backported commits");
            return Ok(Discovery::NoBackports);
        }

        info!(
            repo = %self.repo,
            ?since,
            count = self.backported_commits.len(),
            "discovering upstream relations of backported commits"
        );

        let mut commits = Vec::with_capacity(self.backported_commits.len());
        for sha in &self.backported_commits {
            let message = downstream.message_of(sha)?;
            commits.push(CommitRecord::discover(sha.as_str(), message, upstream, patterns)?);
        }
        self.commits = commits;

        Ok(Discovery::Found(self.commits.len()))
    }

    /// Mark relations that were cherry-picked by any commit of the stream.
    pub fn resolve(&mut self) -> usize {
        RelationResolver::new().resolve(&mut self.commits)
    }

    pub fn repo(&self) -> &RepoCoordinates {
        &self.repo
    }

    pub fn since(&self) -> Option<&str> {
        self.since.as_deref()
    }

    /// Identifiers returned by the backport query, in history order.
    pub fn backported_commits(&self) -> &[String] {
        &self.backported_commits
    }

    pub fn commits(&self) -> &[CommitRecord] {
        &self.commits
    }

    /// Records with a follow-up or revert not known to be backported.
    pub fn needing_attention(&self) -> impl Iterator<Item = &CommitRecord> {
        self.commits.iter().filter(|c| c.needs_attention())
    }

    pub(crate) fn commits_mut(&mut self) -> &mut [CommitRecord] {
        &mut self.commits
    }
}
