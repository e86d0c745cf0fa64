//! Regression Sniffer CLI
//!
//! The `regression-sniffer` command reports downstream backports whose
//! upstream follow-ups or reverts were never backported.
//!
//! ## Run
//!
//! 1. Clone (or reuse) the upstream and downstream working copies
//! 2. Find downstream commits carrying cherry-pick markers since `--from`
//! 3. Look up upstream follow-ups and reverts of every picked commit
//! 4. Drop the ones that were picked too, then enrich the rest from GitHub
//! 5. Print one line per commit needing attention and a summary

use anyhow::{Context, Result};
use clap::Parser;
use sniffer_core::{
    env_file_candidates, github_token, init_tracing, BackportStream, Discovery, EnvDefaults,
    Enricher, GitCli, PatternSet, Report, RepoCoordinates, RunConfig, RunOptions,
};
use sniffer_github::{GitHubClient, GitHubConfig};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn, Level};

#[derive(Parser, Debug)]
#[command(name = "regression-sniffer")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(
    about = "Find upstream follow-ups and reverts of backported commits that were not backported",
    long_about = None
)]
struct Cli {
    /// Component name; the upstream defaults to <component>/<component>
    #[arg(short, long)]
    component: Option<String>,

    /// Downstream repository (<owner>/<repo>)
    #[arg(short, long)]
    downstream: Option<String>,

    /// Reference (usually an upstream tag) to start searching from
    #[arg(short, long)]
    from: Option<String>,

    /// Upstream repository (<owner>/<repo>)
    #[arg(short, long)]
    upstream: Option<String>,

    /// Directory working copies are cloned into
    #[arg(long)]
    workdir: Option<PathBuf>,

    /// Remove cloned working copies when done
    #[arg(short = 'w', long)]
    cleanup: bool,

    /// Disable coloured log output
    #[arg(short, long)]
    nocolor: bool,

    /// Skip GitHub enrichment; no token required
    #[arg(short = 'x', long)]
    dry: bool,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,

    /// Emit JSON-formatted log lines
    #[arg(long)]
    log_json: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn options(&self) -> RunOptions {
        RunOptions {
            component: self.component.clone(),
            upstream: self.upstream.clone(),
            downstream: self.downstream.clone(),
            from: self.from.clone(),
            workdir: self.workdir.clone(),
            cleanup: self.cleanup,
            nocolor: self.nocolor,
            dry: self.dry,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let loaded = load_env_file();
    let cli = Cli::parse();

    let config = cli
        .options()
        .resolve(&EnvDefaults::from_env())
        .context("Invalid configuration")?;

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    init_tracing(cli.log_json, level, !config.nocolor);
    if let Some(path) = loaded {
        debug!("Loaded environment from {}", path.display());
    }

    // Credentials are checked before anything touches the network.
    let token = if config.dry {
        None
    } else {
        Some(github_token(|key| std::env::var(key).ok())?)
    };

    let (report, discovery) = run(&config, token.as_deref()).await?;

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("Failed to serialize report")?
        );
    } else {
        if discovery == Discovery::NoBackports {
            println!("{discovery}");
        }
        print!("{}", report.render_text());
    }

    Ok(())
}

/// Load the first existing `.env` file from the home directory.
///
/// Variables already present in the environment are kept.
fn load_env_file() -> Option<PathBuf> {
    let home = std::env::var_os("HOME").map(PathBuf::from)?;
    let path = env_file_candidates(&home)
        .into_iter()
        .find(|candidate| candidate.is_file())?;
    dotenvy::from_path(&path).ok()?;
    Some(path)
}

/// Working copies used by one run.
struct WorkingCopies {
    upstream: GitCli,
    downstream: GitCli,
}

impl WorkingCopies {
    fn prepare(config: &RunConfig) -> Result<Self> {
        std::fs::create_dir_all(&config.workdir).with_context(|| {
            format!(
                "Failed to create working directory {}",
                config.workdir.display()
            )
        })?;

        let upstream = checkout(&config.upstream, &config.workdir)
            .context("Failed to prepare upstream working copy")?;
        let downstream = match checkout(&config.downstream, &config.workdir) {
            Ok(downstream) => downstream,
            Err(e) => {
                if config.cleanup {
                    if let Err(remove_err) = upstream.remove() {
                        warn!("Failed to remove upstream working copy: {remove_err}");
                    }
                }
                return Err(e).context("Failed to prepare downstream working copy");
            }
        };

        Ok(Self {
            upstream,
            downstream,
        })
    }

    /// Remove the working copies this run cloned; pre-existing ones stay.
    fn remove(self) -> Result<()> {
        self.downstream
            .remove()
            .context("Failed to remove downstream working copy")?;
        self.upstream
            .remove()
            .context("Failed to remove upstream working copy")?;
        Ok(())
    }
}

fn checkout(repo: &RepoCoordinates, workdir: &Path) -> sniffer_core::Result<GitCli> {
    GitCli::clone_or_open(&repo.clone_url(), &workdir.join(repo.working_copy_name()))
}

/// Run discovery, resolution and enrichment. Cleans up on success and on
/// failure when requested; nothing is printed here.
async fn run(config: &RunConfig, token: Option<&str>) -> Result<(Report, Discovery)> {
    let copies = WorkingCopies::prepare(config)?;
    let outcome = analyse(config, &copies, token).await;

    if config.cleanup {
        if let Err(e) = copies.remove() {
            warn!("{e:#}");
        }
    }

    outcome
}

async fn analyse(
    config: &RunConfig,
    copies: &WorkingCopies,
    token: Option<&str>,
) -> Result<(Report, Discovery)> {
    let patterns = PatternSet::for_upstream(&config.upstream);
    let mut stream = BackportStream::new(config.downstream.clone());

    let discovery = stream
        .discover_backports(
            &copies.downstream,
            &copies.upstream,
            &patterns,
            config.since.as_deref(),
        )
        .context("Backport discovery failed")?;

    if let Discovery::Found(count) = discovery {
        let resolved = stream.resolve();
        info!(commits = count, resolved, "relations cross-referenced");

        match token {
            Some(token) => {
                let client = GitHubClient::new(GitHubConfig::from_env().with_token(token));
                let enriched = Enricher::new(&client, &client).enrich(&mut stream).await;
                info!(enriched, "pull request enrichment finished");
            }
            None => info!("dry run, skipping pull request enrichment"),
        }
    }

    Ok((Report::from_stream(&stream), discovery))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::process::Command;

    fn git(dir: &Path, args: &[&str]) -> String {
        let output = Command::new("git")
            .args(args)
            .current_dir(dir)
            .output()
            .unwrap();
        assert!(output.status.success(), "git {:?} failed", args);
        String::from_utf8_lossy(&output.stdout).trim().to_string()
    }

    fn init_repo(dir: &Path) {
        std::fs::create_dir_all(dir).unwrap();
        git(dir, &["init", "-q"]);
        git(dir, &["config", "user.name", "test-user"]);
        git(dir, &["config", "user.email", "test@example.com"]);
        git(dir, &["config", "commit.gpgsign", "false"]);
    }

    fn commit(dir: &Path, message: &str) -> String {
        git(dir, &["commit", "--allow-empty", "-q", "-m", message]);
        git(dir, &["rev-parse", "HEAD"])
    }

    fn dry_config(workdir: &Path, cleanup: bool) -> RunConfig {
        RunOptions {
            upstream: Some("systemd/systemd".to_string()),
            downstream: Some("redhat-plumbers/systemd-rhel10".to_string()),
            workdir: Some(workdir.to_path_buf()),
            cleanup,
            dry: true,
            ..Default::default()
        }
        .resolve(&EnvDefaults::default())
        .unwrap()
    }

    #[test]
    fn test_cli_short_flags() {
        let cli = Cli::try_parse_from([
            "regression-sniffer",
            "-c",
            "systemd",
            "-d",
            "redhat-plumbers/systemd-rhel10",
            "-f",
            "v256",
            "-w",
            "-n",
            "-x",
        ])
        .unwrap();
        let options = cli.options();
        assert_eq!(options.component.as_deref(), Some("systemd"));
        assert_eq!(
            options.downstream.as_deref(),
            Some("redhat-plumbers/systemd-rhel10")
        );
        assert_eq!(options.from.as_deref(), Some("v256"));
        assert!(options.cleanup && options.nocolor && options.dry);
        assert_eq!(options.upstream, None);
    }

    #[test]
    fn test_cli_long_flags() {
        let cli = Cli::try_parse_from([
            "regression-sniffer",
            "--upstream",
            "systemd/systemd",
            "--downstream",
            "a/b",
            "--workdir",
            "/tmp/sniff",
            "--json",
            "--verbose",
        ])
        .unwrap();
        assert!(cli.json && cli.verbose && !cli.log_json);
        assert_eq!(cli.options().workdir, Some(PathBuf::from("/tmp/sniff")));
    }

    #[tokio::test]
    async fn test_dry_run_reports_missing_follow_up() {
        let workdir = tempfile::tempdir().unwrap();
        let up = workdir.path().join("systemd-systemd");
        let down = workdir.path().join("redhat-plumbers-systemd-rhel10");

        init_repo(&up);
        let fix = commit(&up, "socket: fix socket activation");
        let follow_up = commit(&up, &format!("socket: one more case\n\nfollow-up for {fix}"));

        init_repo(&down);
        commit(&down, "downstream: initial");
        let picked = commit(
            &down,
            &format!("socket: fix socket activation\n\n(cherry picked from commit {fix})"),
        );

        let copies = WorkingCopies {
            upstream: GitCli::open(&up).unwrap(),
            downstream: GitCli::open(&down).unwrap(),
        };
        let (report, discovery) = analyse(&dry_config(workdir.path(), false), &copies, None)
            .await
            .unwrap();

        assert_eq!(discovery, Discovery::Found(1));
        assert_eq!(report.total, 1);
        assert_eq!(report.entries[0].sha, picked);
        assert_eq!(report.entries[0].follow_ups[0].sha(), follow_up);
        assert!(report.entries[0].pull_request_number.is_none());
        assert!(up.exists() && down.exists());
    }

    #[tokio::test]
    async fn test_cleanup_keeps_pre_existing_working_copies() {
        let workdir = tempfile::tempdir().unwrap();
        let up = workdir.path().join("systemd-systemd");
        let down = workdir.path().join("redhat-plumbers-systemd-rhel10");
        init_repo(&up);
        commit(&up, "initial");
        init_repo(&down);
        commit(&down, "initial");
        let draft = down.join("my_uncommitted_work.txt");
        std::fs::write(&draft, "draft").unwrap();

        let copies = WorkingCopies {
            upstream: GitCli::open(&up).unwrap(),
            downstream: GitCli::open(&down).unwrap(),
        };
        let (report, discovery) = analyse(&dry_config(workdir.path(), true), &copies, None)
            .await
            .unwrap();
        copies.remove().unwrap();

        assert_eq!(discovery, Discovery::NoBackports);
        assert!(report.is_empty());
        assert!(up.exists());
        assert!(draft.exists());
    }
}
