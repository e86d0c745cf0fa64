//! Commit-history queries.
//!
//! [`RepositoryLog`] is the synchronous query interface the engine consumes.
//! [`GitCli`] implements it by shelling out to `git` inside a local working
//! copy; `fakes::MemoryRepositoryLog` implements it in memory for tests.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tracing::{debug, info, warn};

use crate::error::{Result, SnifferError};

/// Pattern search and message lookup over one commit history.
pub trait RepositoryLog {
    /// Identifiers of commits whose message matches *every* pattern, in the
    /// order the history yields them (newest first). With `since`, only
    /// commits reachable from the head but not from `since` are searched.
    ///
    /// An empty result is not an error. `Err` means the history itself could
    /// not be queried.
    fn grep(&self, patterns: &[String], since: Option<&str>) -> Result<Vec<String>>;

    /// Full message of one commit.
    fn message_of(&self, sha: &str) -> Result<String>;

    /// Fail unless `reference` names a commit of this history.
    fn verify_reference(&self, reference: &str) -> Result<()>;
}

/// [`RepositoryLog`] backed by the `git` binary and a local working copy.
///
/// Queries run against `head`: `HEAD` for a fresh clone or an opened working
/// copy, the fetched remote head for a reused one. The working tree itself
/// is never modified.
#[derive(Debug, Clone)]
pub struct GitCli {
    work_dir: PathBuf,
    head: String,
    cloned: bool,
}

impl GitCli {
    /// Use an existing working copy. `work_dir` must be the top level of the
    /// work tree, not a directory nested inside one.
    pub fn open(work_dir: impl Into<PathBuf>) -> Result<Self> {
        let work_dir = work_dir.into();
        if !is_git_repo(&work_dir) {
            return Err(SnifferError::Git(format!(
                "{} is not the top level of a git working copy",
                work_dir.display()
            )));
        }
        Ok(Self {
            work_dir,
            head: "HEAD".to_string(),
            cloned: false,
        })
    }

    /// Clone `url` into `work_dir`, or reuse the working copy already there.
    ///
    /// A reused working copy is brought up to date by fetching the remote
    /// head (and tags) from `url`; queries then run against the fetched
    /// head. Only a working copy cloned here is deleted by [`GitCli::remove`].
    pub fn clone_or_open(url: &str, work_dir: &Path) -> Result<Self> {
        if is_git_repo(work_dir) {
            info!("Reusing working copy at {}", work_dir.display());
            let mut git = Self::open(work_dir)?;
            git.refresh(url)?;
            return Ok(git);
        }

        info!("Cloning {} into {}", url, work_dir.display());
        let output = Command::new("git")
            .arg("clone")
            .arg("--quiet")
            .arg(url)
            .arg(work_dir)
            .output()
            .map_err(|e| SnifferError::Git(format!("failed to run git: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SnifferError::Git(format!("git clone {url} failed: {stderr}")));
        }

        let mut git = Self::open(work_dir)?;
        git.cloned = true;
        Ok(git)
    }

    pub fn path(&self) -> &Path {
        &self.work_dir
    }

    /// Revision the history queries start from.
    pub fn head(&self) -> &str {
        &self.head
    }

    /// Whether this working copy was cloned by [`GitCli::clone_or_open`].
    pub fn is_owned(&self) -> bool {
        self.cloned
    }

    /// Delete the working copy if it was cloned by this process. Working
    /// copies that were only opened or reused are left untouched.
    pub fn remove(self) -> Result<()> {
        if !self.cloned {
            info!(
                "Keeping working copy at {}: not cloned by this run",
                self.work_dir.display()
            );
            return Ok(());
        }
        info!("Removing working copy at {}", self.work_dir.display());
        std::fs::remove_dir_all(&self.work_dir)?;
        Ok(())
    }

    fn refresh(&mut self, url: &str) -> Result<()> {
        let output = self.run(["fetch", "--quiet", "--tags", "--force", url, "HEAD"])?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SnifferError::Git(format!(
                "git fetch {url} failed: {}",
                stderr.trim()
            )));
        }
        self.head = self.rev_parse("FETCH_HEAD")?;
        debug!(head = %self.head, dir = %self.work_dir.display(), "working copy refreshed");
        Ok(())
    }

    fn rev_parse(&self, reference: &str) -> Result<String> {
        let spec = format!("{reference}^{{commit}}");
        let output = self.run(["rev-parse", "--verify", "--quiet", spec.as_str()])?;
        if !output.status.success() {
            return Err(SnifferError::Git(format!(
                "unknown revision '{reference}' in {}",
                self.work_dir.display()
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    fn run<I, S>(&self, args: I) -> Result<Output>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<std::ffi::OsStr>,
    {
        Command::new("git")
            .args(args)
            .current_dir(&self.work_dir)
            .output()
            .map_err(|e| SnifferError::Git(format!("failed to run git: {e}")))
    }
}

impl RepositoryLog for GitCli {
    fn grep(&self, patterns: &[String], since: Option<&str>) -> Result<Vec<String>> {
        let mut args: Vec<String> = vec![
            "log".to_string(),
            "--format=%H".to_string(),
            "--extended-regexp".to_string(),
            "--all-match".to_string(),
        ];
        args.extend(patterns.iter().map(|p| format!("--grep={p}")));
        match since {
            Some(since) => args.push(format!("{since}..{}", self.head)),
            None => args.push(self.head.clone()),
        }

        debug!(?patterns, ?since, dir = %self.work_dir.display(), "git log --grep");
        let output = self.run(&args)?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!("git log failed, treating as no matches: {}", stderr.trim());
            return Ok(Vec::new());
        }

        Ok(String::from_utf8_lossy(&output.stdout)
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect())
    }

    fn message_of(&self, sha: &str) -> Result<String> {
        let output = self.run(["show", "--no-patch", "--format=%B", sha])?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SnifferError::Git(format!(
                "git show {sha} failed: {}",
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim_end().to_string())
    }

    fn verify_reference(&self, reference: &str) -> Result<()> {
        self.rev_parse(reference).map(|_| ())
    }
}

/// Check whether `dir` is the top level of a git work tree.
///
/// Directories nested inside a work tree do not count.
pub fn is_git_repo(dir: &Path) -> bool {
    let output = match Command::new("git")
        .args(["rev-parse", "--show-toplevel"])
        .current_dir(dir)
        .output()
    {
        Ok(output) if output.status.success() => output,
        _ => return false,
    };

    let toplevel = PathBuf::from(String::from_utf8_lossy(&output.stdout).trim());
    match (toplevel.canonicalize(), dir.canonicalize()) {
        (Ok(toplevel), Ok(dir)) => toplevel == dir,
        _ => false,
    }
}
