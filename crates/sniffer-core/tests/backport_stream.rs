//! End-to-end behaviour of discovery, resolution, enrichment and reporting
//! over in-memory histories.

use sniffer_core::fakes::{MemoryPullRequests, MemoryRepositoryLog};
use sniffer_core::{
    BackportStream, Discovery, Enricher, Label, PatternSet, PullRequest, RepoCoordinates, Report,
    WAIVER_LABEL,
};

const X: &str = "941a12dcba57f6673230a9c413738c51374d2998";
const Y: &str = "123456dcba57f6673230a9c413738c51374d2998";
const R: &str = "fedcba9876543210fedcba9876543210fedcba98";

fn upstream_repo() -> RepoCoordinates {
    RepoCoordinates::new("systemd", "systemd")
}

fn downstream_repo() -> RepoCoordinates {
    RepoCoordinates::new("redhat-plumbers", "systemd-rhel10")
}

/// X is a fix, Y follows up on X by URL, R reverts X.
fn upstream() -> MemoryRepositoryLog {
    MemoryRepositoryLog::new()
        .commit(X, "socket: fix socket activation of stopped services")
        .commit(
            Y,
            format!(
                "socket: handle one more case\n\n\
                 follow-up for https://github.com/systemd/systemd/commit/{X}"
            ),
        )
        .commit(R, format!("Revert \"socket: ...\"\n\nThis reverts commit {X}."))
}

fn picked(subject: &str, sha: &str) -> String {
    format!("{subject}\n\n(cherry picked from commit {sha})\n\nResolves: RHEL-60896")
}

fn run(downstream: &MemoryRepositoryLog) -> BackportStream {
    let patterns = PatternSet::for_upstream(&upstream_repo());
    let mut stream = BackportStream::new(downstream_repo());
    stream
        .discover_backports(downstream, &upstream(), &patterns, None)
        .unwrap();
    stream.resolve();
    stream
}

#[test]
fn missing_follow_up_and_revert_are_reported() {
    let downstream = MemoryRepositoryLog::new()
        .commit("base", "downstream: packaging")
        .commit("d1", picked("socket: fix socket activation", X));

    let stream = run(&downstream);
    let report = Report::from_stream(&stream);

    assert_eq!(report.total, 1);
    let entry = &report.entries[0];
    assert_eq!(entry.sha, "d1");
    assert_eq!(entry.follow_ups.len(), 1);
    assert_eq!(entry.follow_ups[0].sha(), Y);
    assert_eq!(entry.reverts.len(), 1);
    assert_eq!(entry.reverts[0].sha(), R);
    assert!(report
        .render_text()
        .ends_with("Found 1 commits with follow-ups or reverts\n"));
}

#[test]
fn backported_follow_up_is_resolved() {
    let downstream = MemoryRepositoryLog::new()
        .commit("d1", picked("socket: fix socket activation", X))
        .commit("d2", picked("socket: handle one more case", Y));

    let stream = run(&downstream);
    let d1 = stream.commits().iter().find(|c| c.sha() == "d1").unwrap();

    assert_eq!(d1.follow_ups()[0].backported(), Some(true));
    // The revert is still missing, so d1 remains reportable.
    assert_eq!(d1.reverts()[0].backported(), None);
    assert!(d1.needs_attention());
}

#[test]
fn fully_backported_history_reports_nothing() {
    let downstream = MemoryRepositoryLog::new()
        .commit("d1", picked("socket: fix socket activation", X))
        .commit("d2", picked("socket: handle one more case", Y))
        .commit("d3", picked("Revert socket fix", R));

    let report = Report::from_stream(&run(&downstream));
    assert!(report.is_empty());
    assert_eq!(report.summary(), "Found 0 commits with follow-ups or reverts");
}

#[test]
fn no_backports_reports_zero_candidates() {
    let downstream = MemoryRepositoryLog::new().commit("d1", "downstream-only change");
    let patterns = PatternSet::for_upstream(&upstream_repo());
    let mut stream = BackportStream::new(downstream_repo());

    let discovery = stream
        .discover_backports(&downstream, &upstream(), &patterns, None)
        .unwrap();

    assert_eq!(discovery, Discovery::NoBackports);
    assert!(stream.commits().is_empty());
    assert_eq!(Report::from_stream(&stream).total, 0);
}

#[tokio::test]
async fn waiver_label_is_reported_while_backport_status_stays_unknown() {
    let downstream =
        MemoryRepositoryLog::new().commit("d1", picked("socket: fix socket activation", X));
    let mut stream = run(&downstream);

    let lookups = MemoryPullRequests::new().with_pull_request(
        "d1",
        PullRequest {
            number: 45,
            html_url: Some("https://github.com/redhat-plumbers/systemd-rhel10/pull/45".into()),
            body: Some("Backport of socket fixes".into()),
            labels: vec![Label {
                name: WAIVER_LABEL.to_string(),
            }],
        },
    );
    Enricher::new(&lookups, &lookups).enrich(&mut stream).await;

    let report = Report::from_stream(&stream);
    let entry = &report.entries[0];
    assert_eq!(entry.pull_request_number, Some(45));
    assert_eq!(entry.waived, Some(true));
    assert_eq!(entry.follow_ups[0].backported(), None);
    assert_eq!(entry.follow_ups[0].waived(), Some(true));
    assert!(entry.render_line().ends_with(" - #45 - waived: true"));
}

#[tokio::test]
async fn enrichment_follows_discovery_order() {
    let downstream = MemoryRepositoryLog::new()
        .commit("d1", picked("first", X))
        .commit("d2", picked("second", X));
    let mut stream = run(&downstream);

    let lookups = MemoryPullRequests::new().failing_for("d2");
    Enricher::new(&lookups, &lookups).enrich(&mut stream).await;

    assert_eq!(lookups.requests(), vec!["d2".to_string(), "d1".to_string()]);
    assert_eq!(Report::from_stream(&stream).total, 2);
}
