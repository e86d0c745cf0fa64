//! Cross-referencing of follow-ups and reverts against the backport set.

use std::collections::HashSet;

use tracing::debug;

use crate::commit::CommitRecord;

/// Marks follow-ups and reverts that were themselves cherry-picked downstream.
///
/// This is the only writer of the `backported` flag. It never clears a flag
/// and never infers "not backported": a reference with no match keeps an
/// unknown status. Running it again over the same records changes nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct RelationResolver;

impl RelationResolver {
    pub fn new() -> Self {
        Self
    }

    /// Resolve every record against the cherry-pick sources of all records.
    /// Returns how many references were newly marked.
    pub fn resolve(&self, commits: &mut [CommitRecord]) -> usize {
        let sources: HashSet<String> = commits
            .iter()
            .flat_map(|commit| commit.cherry_picks())
            .map(|reference| reference.sha().to_string())
            .collect();

        let mut marked = 0;
        for commit in commits.iter_mut() {
            for relation in commit.relations_mut() {
                if relation.is_unresolved() && sources.contains(relation.sha()) {
                    relation.mark_backported();
                    marked += 1;
                }
            }
        }

        debug!(sources = sources.len(), marked, "relations resolved");
        marked
    }
}
