//! Pull-request enrichment of commits that still need attention.
//!
//! Runs after resolution. Records are visited one at a time in discovery
//! order and each lookup is awaited before the next starts. A missing pull
//! request, a missing marker or a failed lookup leaves the record reportable
//! without enrichment.

use tracing::{debug, warn};

use crate::commit::{CommitRecord, PullRequestRef, ShaReference};
use crate::pull_request::{IssueCommentLookup, PullRequestLookup};
use crate::repo::RepoCoordinates;
use crate::stream::BackportStream;

/// Attaches pull-request context to reportable commits.
pub struct Enricher<'a> {
    pulls: &'a dyn PullRequestLookup,
    comments: &'a dyn IssueCommentLookup,
}

impl<'a> Enricher<'a> {
    pub fn new(pulls: &'a dyn PullRequestLookup, comments: &'a dyn IssueCommentLookup) -> Self {
        Self { pulls, comments }
    }

    /// Enrich every commit of `stream` that needs attention. Returns how many
    /// gained a pull request.
    pub async fn enrich(&self, stream: &mut BackportStream) -> usize {
        let repo = stream.repo().clone();
        let mut enriched = 0;
        for commit in stream.commits_mut() {
            if !commit.needs_attention() {
                continue;
            }
            if self.enrich_commit(&repo, commit).await {
                enriched += 1;
            }
        }
        enriched
    }

    async fn enrich_commit(&self, repo: &RepoCoordinates, commit: &mut CommitRecord) -> bool {
        let pr = match self.pulls.find(commit.sha(), repo).await {
            Ok(Some(pr)) => pr,
            Ok(None) => {
                debug!(sha = commit.sha(), "no pull request");
                return false;
            }
            Err(e) => {
                warn!(sha = commit.sha(), "pull request lookup failed: {e}");
                return false;
            }
        };

        let waived = pr.has_waiver_label();
        if waived {
            commit
                .relations_mut()
                .filter(|r| r.is_unresolved())
                .for_each(ShaReference::mark_waived);
        }

        let comment = match pr.comment_marker_id() {
            Some(id) => match self.comments.fetch(repo, &id).await {
                Ok(body) => body,
                Err(e) => {
                    warn!(sha = commit.sha(), comment_id = %id, "comment lookup failed: {e}");
                    None
                }
            },
            None => None,
        };

        debug!(sha = commit.sha(), pr = pr.number, waived, "pull request attached");
        commit.attach_pull_request(PullRequestRef {
            number: pr.number,
            html_url: pr.html_url,
            waived,
            comment,
        });
        true
    }
}
