//! Regression Sniffer Core Library
//!
//! Backport correlation engine: finds downstream commits that cherry-picked
//! upstream work, discovers the upstream follow-ups and reverts of that work,
//! and reports the ones that were never backported themselves.
//!
//! ## Flow
//!
//! 1. [`BackportStream::discover_backports`] enumerates downstream commits
//!    with cherry-pick markers and builds a [`CommitRecord`] for each.
//! 2. [`BackportStream::resolve`] marks relations that were picked too.
//! 3. [`Enricher::enrich`] attaches pull-request context to what remains.
//! 4. [`Report::from_stream`] collects the commits needing attention.

pub mod commit;
pub mod config;
pub mod enrich;
pub mod error;
pub mod fakes;
pub mod git;
pub mod patterns;
pub mod pull_request;
pub mod repo;
pub mod report;
pub mod resolver;
pub mod stream;
pub mod telemetry;

pub use commit::{discover_related, CommitRecord, PullRequestRef, ShaReference};
pub use config::{env_file_candidates, github_token, EnvDefaults, RunConfig, RunOptions};
pub use enrich::Enricher;
pub use error::{Result, SnifferError};
pub use git::{is_git_repo, GitCli, RepositoryLog};
pub use patterns::{PatternGroup, PatternSet, ANY_SHA, SHA_PLACEHOLDER};
pub use pull_request::{IssueCommentLookup, Label, PullRequest, PullRequestLookup, WAIVER_LABEL};
pub use repo::RepoCoordinates;
pub use report::{Report, ReportEntry};
pub use resolver::RelationResolver;
pub use stream::{BackportStream, Discovery};
pub use telemetry::init_tracing;
