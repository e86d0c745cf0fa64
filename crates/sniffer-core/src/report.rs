//! Report of backports whose upstream follow-ups or reverts need attention.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::commit::{CommitRecord, ShaReference};
use crate::stream::BackportStream;

/// One downstream commit with at least one unresolved follow-up or revert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportEntry {
    pub sha: String,
    pub follow_ups: Vec<ShaReference>,
    pub reverts: Vec<ShaReference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pull_request_number: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pull_request_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub waived: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl ReportEntry {
    pub fn from_commit(commit: &CommitRecord) -> Self {
        let pr = commit.pull_request();
        Self {
            sha: commit.sha().to_string(),
            follow_ups: commit.follow_ups().to_vec(),
            reverts: commit.reverts().to_vec(),
            pull_request_number: pr.map(|pr| pr.number),
            pull_request_url: pr.and_then(|pr| pr.html_url.clone()),
            waived: pr.map(|pr| pr.waived),
            comment: pr.and_then(|pr| pr.comment.clone()),
        }
    }

    /// `<sha> - <follow-ups> - <reverts>[ - #<pr> - waived: <bool>]`
    pub fn render_line(&self) -> String {
        let follow_ups = serde_json::to_string(&self.follow_ups).unwrap_or_default();
        let reverts = serde_json::to_string(&self.reverts).unwrap_or_default();
        let mut line = format!("{} - {} - {}", self.sha, follow_ups, reverts);
        if let Some(number) = self.pull_request_number {
            line.push_str(&format!(
                " - #{} - waived: {}",
                number,
                self.waived.unwrap_or(false)
            ));
        }
        line
    }
}

/// Reportable commits of one run, in discovery order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub generated_at: DateTime<Utc>,
    pub downstream: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub since: Option<String>,
    pub entries: Vec<ReportEntry>,
    pub total: usize,
}

impl Report {
    pub fn from_stream(stream: &BackportStream) -> Self {
        let entries: Vec<ReportEntry> = stream
            .needing_attention()
            .map(ReportEntry::from_commit)
            .collect();
        Self {
            generated_at: Utc::now(),
            downstream: stream.repo().slug(),
            since: stream.since().map(str::to_string),
            total: entries.len(),
            entries,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn summary(&self) -> String {
        format!("Found {} commits with follow-ups or reverts", self.total)
    }

    /// One line per entry, preceded by its linked comment when there is one,
    /// then the summary line.
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        for entry in &self.entries {
            if let Some(comment) = &entry.comment {
                out.push_str(comment);
                out.push('\n');
            }
            out.push_str(&entry.render_line());
            out.push('\n');
        }
        out.push_str(&self.summary());
        out.push('\n');
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::MemoryRepositoryLog;
    use crate::patterns::PatternSet;
    use crate::repo::RepoCoordinates;

    fn resolved_stream() -> BackportStream {
        let upstream = MemoryRepositoryLog::new()
            .commit("aaaaaaa", "fix")
            .commit("bbbbbbb", "follow-up for aaaaaaa")
            .commit("ccccccc", "other fix")
            .commit("ddddddd", "follow-up to ccccccc");
        let downstream = MemoryRepositoryLog::new()
            .commit("d1", "x\n(cherry picked from commit aaaaaaa)")
            .commit("d2", "y\n(cherry picked from commit bbbbbbb)")
            .commit("d3", "z\n(cherry picked from commit ccccccc)");
        let patterns = PatternSet::for_upstream(&RepoCoordinates::new("up", "up"));
        let mut stream = BackportStream::new(RepoCoordinates::new("down", "stream"));
        stream
            .discover_backports(&downstream, &upstream, &patterns, Some("d1"))
            .unwrap();
        stream.resolve();
        stream
    }

    #[test]
    fn test_report_lists_only_unresolved_commits() {
        let stream = resolved_stream();
        // d1 falls before `since`; d2 has no relations; d3's follow-up
        // ddddddd was never picked.
        let report = Report::from_stream(&stream);
        assert_eq!(report.total, 1);
        assert_eq!(report.entries[0].sha, "d3");
        assert_eq!(report.downstream, "down/stream");
        assert_eq!(report.since.as_deref(), Some("d1"));
    }

    #[test]
    fn test_render_line_without_pull_request() {
        let report = Report::from_stream(&resolved_stream());
        assert_eq!(
            report.entries[0].render_line(),
            r#"d3 - [{"sha":"ddddddd"}] - []"#
        );
    }

    #[test]
    fn test_render_line_with_pull_request() {
        let entry = ReportEntry {
            sha: "d3".to_string(),
            follow_ups: vec![ShaReference::new("ddddddd")],
            reverts: vec![],
            pull_request_number: Some(45),
            pull_request_url: None,
            waived: Some(true),
            comment: None,
        };
        assert_eq!(
            entry.render_line(),
            r#"d3 - [{"sha":"ddddddd"}] - [] - #45 - waived: true"#
        );
    }

    #[test]
    fn test_empty_report_summary() {
        let stream = BackportStream::new(RepoCoordinates::new("down", "stream"));
        let report = Report::from_stream(&stream);
        assert!(report.is_empty());
        assert_eq!(
            report.render_text(),
            "Found 0 commits with follow-ups or reverts\n"
        );
    }

    #[test]
    fn test_report_serializes_to_json() {
        let report = Report::from_stream(&resolved_stream());
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["total"], 1);
        assert_eq!(value["entries"][0]["follow_ups"][0]["sha"], "ddddddd");
        assert!(value["entries"][0].get("pull_request_number").is_none());
    }
}
