//! Repository coordinates (`owner/repo`) on the code-hosting platform.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SnifferError};

const HOST: &str = "https://github.com";

/// Identifies a hosted repository by owner and name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepoCoordinates {
    pub owner: String,
    pub repo: String,
}

impl RepoCoordinates {
    pub fn new(owner: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
        }
    }

    /// Parse an `owner/repo` string. Both parts must be non-empty and there
    /// must be exactly one separator.
    pub fn parse(name: &str) -> Result<Self> {
        let mut parts = name.split('/');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(owner), Some(repo), None) if !owner.is_empty() && !repo.is_empty() => {
                Ok(Self::new(owner, repo))
            }
            _ => Err(SnifferError::InvalidRepository(name.to_string())),
        }
    }

    /// `owner/repo`
    pub fn slug(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }

    pub fn clone_url(&self) -> String {
        format!("{HOST}/{}/{}.git", self.owner, self.repo)
    }

    /// Prefix of a commit permalink, e.g. `https://github.com/o/r/commit/`.
    pub fn commit_url_prefix(&self) -> String {
        format!("{HOST}/{}/{}/commit/", self.owner, self.repo)
    }

    /// Directory name used for the local working copy.
    pub fn working_copy_name(&self) -> String {
        format!("{}-{}", self.owner, self.repo)
    }
}

impl FromStr for RepoCoordinates {
    type Err = SnifferError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for RepoCoordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_owner_repo() {
        let repo = RepoCoordinates::parse("redhat-plumbers/systemd-rhel10").unwrap();
        assert_eq!(repo.owner, "redhat-plumbers");
        assert_eq!(repo.repo, "systemd-rhel10");
        assert_eq!(repo.slug(), "redhat-plumbers/systemd-rhel10");
    }

    #[test]
    fn test_parse_rejects_malformed_names() {
        for bad in ["systemd", "/systemd", "systemd/", "a/b/c", ""] {
            assert!(
                matches!(
                    RepoCoordinates::parse(bad),
                    Err(SnifferError::InvalidRepository(_))
                ),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_urls() {
        let repo: RepoCoordinates = "systemd/systemd".parse().unwrap();
        assert_eq!(repo.clone_url(), "https://github.com/systemd/systemd.git");
        assert_eq!(
            repo.commit_url_prefix(),
            "https://github.com/systemd/systemd/commit/"
        );
        assert_eq!(repo.working_copy_name(), "systemd-systemd");
        assert_eq!(repo.to_string(), "systemd/systemd");
    }
}
