//! Catalogue of commit-message patterns.
//!
//! Four groups recognise the relationships the engine cares about:
//! - [`PatternGroup::CherryPick`]: the marker `git cherry-pick -x` appends
//! - [`PatternGroup::Mention`]: a bare sha or commit URL
//! - [`PatternGroup::FollowUp`]: "follow-up", "followup for", "follow up to" ...
//! - [`PatternGroup::Revert`]: "This reverts commit ...", "revert: ..."
//!
//! Templates carry a [`SHA_PLACEHOLDER`] that is bound to a concrete hash
//! before a query. Every template is POSIX-extended compatible so it can be
//! passed to `git log -E --grep` unchanged, and is also valid `regex` syntax
//! for in-process matching. Matching is case-sensitive; wording variants are
//! spelled out in the templates instead.

use regex::Regex;

use crate::repo::RepoCoordinates;

/// Substitution point for the target hash.
pub const SHA_PLACEHOLDER: &str = "%{sha}%";

/// Placeholder binding that matches any hash.
pub const ANY_SHA: &str = "[0-9a-f]+";

const CHERRY_PICK_EXTRACTOR: &str = r"\(cherry picked from commit (\b[0-9a-f]{5,40}\b)\)";

/// The relationship a pattern group recognises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PatternGroup {
    CherryPick,
    Mention,
    FollowUp,
    Revert,
}

/// Fixed pattern catalogue, built once per run for a given upstream.
#[derive(Debug, Clone)]
pub struct PatternSet {
    cherry_pick: Vec<String>,
    mention: Vec<String>,
    follow_up: Vec<String>,
    revert: Vec<String>,
    extractor: Regex,
}

impl PatternSet {
    /// Build the catalogue; URL alternatives point at `upstream`'s commits.
    pub fn for_upstream(upstream: &RepoCoordinates) -> Self {
        let url = regex::escape(&upstream.commit_url_prefix());

        Self {
            cherry_pick: vec![format!(r"\(cherry picked from commit {SHA_PLACEHOLDER}\)")],
            mention: vec![format!("({url})?({SHA_PLACEHOLDER})")],
            follow_up: vec![format!(
                "follow[- ]?up *(|:|-|for|to) *({url})?({SHA_PLACEHOLDER})"
            )],
            revert: vec![format!(
                "(This)? *reverts? *(commit)? *(|:|-) *({url})?({SHA_PLACEHOLDER})"
            )],
            extractor: Regex::new(CHERRY_PICK_EXTRACTOR)
                .expect("cherry-pick extractor is a valid regex"),
        }
    }

    /// Unbound templates of one group.
    pub fn templates(&self, group: PatternGroup) -> &[String] {
        match group {
            PatternGroup::CherryPick => &self.cherry_pick,
            PatternGroup::Mention => &self.mention,
            PatternGroup::FollowUp => &self.follow_up,
            PatternGroup::Revert => &self.revert,
        }
    }

    /// Templates of `groups`, in order, with the placeholder bound to `sha`.
    pub fn bind(&self, groups: &[PatternGroup], sha: &str) -> Vec<String> {
        groups
            .iter()
            .flat_map(|group| self.templates(*group))
            .map(|template| template.replace(SHA_PLACEHOLDER, sha))
            .collect()
    }

    /// A follow-up must both mention `sha` and use follow-up phrasing.
    pub fn follow_up_query(&self, sha: &str) -> Vec<String> {
        self.bind(&[PatternGroup::Mention, PatternGroup::FollowUp], sha)
    }

    pub fn revert_query(&self, sha: &str) -> Vec<String> {
        self.bind(&[PatternGroup::Revert], sha)
    }

    /// Matches every commit carrying a cherry-pick marker, whatever its source.
    pub fn backport_query(&self) -> Vec<String> {
        self.bind(&[PatternGroup::CherryPick], ANY_SHA)
    }

    /// Source hashes of every cherry-pick marker in `message`, in textual
    /// order, deduplicated by first occurrence.
    pub fn extract_cherry_picks(&self, message: &str) -> Vec<String> {
        let mut shas: Vec<String> = Vec::new();
        for captures in self.extractor.captures_iter(message) {
            let sha = &captures[1];
            if !shas.iter().any(|s| s == sha) {
                shas.push(sha.to_string());
            }
        }
        shas
    }
}
