//! Downstream commits and their upstream relations.
//!
//! A [`CommitRecord`] is built eagerly: construction extracts the cherry-pick
//! provenance from the message and queries the upstream history for
//! follow-ups and reverts of every cherry-picked source. After construction
//! only the status flags of its [`ShaReference`]s change, and only through
//! the resolver (`backported`) and the enrichment pass (`waived`).

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;
use crate::git::RepositoryLog;
use crate::patterns::PatternSet;

/// One commit identifier plus what the run has learned about it.
///
/// Both flags are `None` until proven; once set they stay `Some(true)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShaReference {
    sha: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    backported: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    waived: Option<bool>,
}

impl ShaReference {
    pub fn new(sha: impl Into<String>) -> Self {
        Self {
            sha: sha.into(),
            backported: None,
            waived: None,
        }
    }

    pub fn sha(&self) -> &str {
        &self.sha
    }

    /// `Some(true)` once the resolver found it cherry-picked downstream.
    pub fn backported(&self) -> Option<bool> {
        self.backported
    }

    /// `Some(true)` once a waiver label covered it.
    pub fn waived(&self) -> Option<bool> {
        self.waived
    }

    /// Still needs investigation: not known to be backported.
    pub fn is_unresolved(&self) -> bool {
        self.backported.is_none()
    }

    pub(crate) fn mark_backported(&mut self) {
        self.backported = Some(true);
    }

    pub(crate) fn mark_waived(&mut self) {
        self.waived = Some(true);
    }
}

/// Pull request a downstream commit arrived through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestRef {
    pub number: u64,
    pub html_url: Option<String>,
    pub waived: bool,
    /// Body of the linked review comment, when the PR references one.
    pub comment: Option<String>,
}

/// A downstream commit with its cherry-pick provenance and upstream relations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitRecord {
    sha: String,
    message: String,
    cherry_picks: Vec<ShaReference>,
    follow_ups: Vec<ShaReference>,
    reverts: Vec<ShaReference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pull_request: Option<PullRequestRef>,
}

impl CommitRecord {
    /// Build the record, querying `upstream` for follow-ups and reverts of
    /// every cherry-picked source.
    ///
    /// Per source, one follow-up query (mention + follow-up phrasing) and one
    /// revert query are issued. A commit without cherry-pick markers issues
    /// no queries and has empty relation lists.
    pub fn discover(
        sha: impl Into<String>,
        message: impl Into<String>,
        upstream: &dyn RepositoryLog,
        patterns: &PatternSet,
    ) -> Result<Self> {
        let sha = sha.into();
        let message = message.into();
        let sources = patterns.extract_cherry_picks(&message);

        let mut follow_ups: Vec<String> = Vec::new();
        let mut reverts: Vec<String> = Vec::new();
        for source in &sources {
            follow_ups.extend(discover_related(
                upstream,
                &patterns.follow_up_query(source),
            )?);
            reverts.extend(discover_related(upstream, &patterns.revert_query(source))?);
        }

        debug!(
            %sha,
            cherry_picks = sources.len(),
            follow_ups = follow_ups.len(),
            reverts = reverts.len(),
            "commit relations discovered"
        );

        Ok(Self {
            sha,
            message,
            cherry_picks: to_references(sources),
            follow_ups: to_references(follow_ups),
            reverts: to_references(reverts),
            pull_request: None,
        })
    }

    pub fn sha(&self) -> &str {
        &self.sha
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Upstream commits this commit claims to have cherry-picked.
    pub fn cherry_picks(&self) -> &[ShaReference] {
        &self.cherry_picks
    }

    pub fn follow_ups(&self) -> &[ShaReference] {
        &self.follow_ups
    }

    pub fn reverts(&self) -> &[ShaReference] {
        &self.reverts
    }

    pub fn pull_request(&self) -> Option<&PullRequestRef> {
        self.pull_request.as_ref()
    }

    /// Carries at least one cherry-pick marker.
    pub fn is_backport(&self) -> bool {
        !self.cherry_picks.is_empty()
    }

    /// Whether `sha` is one of this commit's cherry-pick sources.
    pub fn cherry_picked(&self, sha: &str) -> bool {
        self.cherry_picks.iter().any(|c| c.sha == sha)
    }

    /// Follow-ups and reverts, in that order.
    pub fn relations(&self) -> impl Iterator<Item = &ShaReference> {
        self.follow_ups.iter().chain(self.reverts.iter())
    }

    /// Has a follow-up or revert not known to be backported.
    pub fn needs_attention(&self) -> bool {
        self.relations().any(ShaReference::is_unresolved)
    }

    pub(crate) fn relations_mut(&mut self) -> impl Iterator<Item = &mut ShaReference> {
        self.follow_ups.iter_mut().chain(self.reverts.iter_mut())
    }

    pub(crate) fn attach_pull_request(&mut self, pull_request: PullRequestRef) {
        self.pull_request = Some(pull_request);
    }
}

/// Query `upstream` for commits matching all `patterns`, deduplicated in
/// first-seen order.
pub fn discover_related(upstream: &dyn RepositoryLog, patterns: &[String]) -> Result<Vec<String>> {
    Ok(dedup(upstream.grep(patterns, None)?))
}

fn dedup(shas: Vec<String>) -> Vec<String> {
    let mut seen: Vec<String> = Vec::with_capacity(shas.len());
    for sha in shas {
        if !seen.contains(&sha) {
            seen.push(sha);
        }
    }
    seen
}

fn to_references(shas: Vec<String>) -> Vec<ShaReference> {
    dedup(shas).into_iter().map(ShaReference::new).collect()
}
