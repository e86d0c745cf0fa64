//! Run configuration.
//!
//! Precedence is command-line value, then environment default, then built-in
//! default. Environment defaults are read from:
//! - `COMPONENT`, `UPSTREAM`, `DOWNSTREAM` (strings)
//! - `CLEANUP`, `NOCOLOR`, `DRY` (flags, `false` when unset)
//!
//! Setting `NODEFAULTS` disables all of them. Credentials are read
//! separately with [`github_token`].

use std::path::{Path, PathBuf};

use crate::error::{Result, SnifferError};
use crate::repo::RepoCoordinates;

pub const TOKEN_VAR: &str = "GITHUB_API_TOKEN";
pub const API_URL_VAR: &str = "GITHUB_API_URL";
pub const NO_DEFAULTS_VAR: &str = "NODEFAULTS";

/// Defaults taken from the environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvDefaults {
    pub component: Option<String>,
    pub upstream: Option<String>,
    pub downstream: Option<String>,
    pub cleanup: bool,
    pub nocolor: bool,
    pub dry: bool,
}

impl EnvDefaults {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let value = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if value(NO_DEFAULTS_VAR).is_some() {
            return Self::default();
        }

        let flag = |key: &str| value(key).map(|v| is_truthy(&v)).unwrap_or(false);

        Self {
            component: value("COMPONENT"),
            upstream: value("UPSTREAM"),
            downstream: value("DOWNSTREAM"),
            cleanup: flag("CLEANUP"),
            nocolor: flag("NOCOLOR"),
            dry: flag("DRY"),
        }
    }
}

fn is_truthy(value: &str) -> bool {
    !matches!(value.to_ascii_lowercase().as_str(), "0" | "false" | "no" | "off")
}

/// Raw values given on the command line.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub component: Option<String>,
    pub upstream: Option<String>,
    pub downstream: Option<String>,
    pub from: Option<String>,
    pub workdir: Option<PathBuf>,
    pub cleanup: bool,
    pub nocolor: bool,
    pub dry: bool,
}

/// Fully resolved configuration of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    pub component: Option<String>,
    pub upstream: RepoCoordinates,
    pub downstream: RepoCoordinates,
    /// Upstream reference (usually a tag) to start searching from.
    pub since: Option<String>,
    /// Directory the working copies are cloned into.
    pub workdir: PathBuf,
    pub cleanup: bool,
    pub nocolor: bool,
    pub dry: bool,
}

impl RunOptions {
    /// Merge with `defaults` and validate.
    ///
    /// The downstream is required. Without an explicit upstream, the
    /// upstream is `<component>/<component>`.
    pub fn resolve(self, defaults: &EnvDefaults) -> Result<RunConfig> {
        let component = self.component.or_else(|| defaults.component.clone());

        let downstream = self
            .downstream
            .or_else(|| defaults.downstream.clone())
            .ok_or_else(|| SnifferError::MissingConfig("downstream <owner>/<repo>".to_string()))?;
        let downstream = RepoCoordinates::parse(&downstream)?;

        let upstream = match self.upstream.or_else(|| defaults.upstream.clone()) {
            Some(upstream) => RepoCoordinates::parse(&upstream)?,
            None => match &component {
                Some(component) => RepoCoordinates::new(component, component),
                None => {
                    return Err(SnifferError::MissingConfig(
                        "upstream <owner>/<repo> or component".to_string(),
                    ))
                }
            },
        };

        Ok(RunConfig {
            component,
            upstream,
            downstream,
            since: self.from,
            workdir: self.workdir.unwrap_or_else(|| PathBuf::from(".")),
            cleanup: self.cleanup || defaults.cleanup,
            nocolor: self.nocolor || defaults.nocolor,
            dry: self.dry || defaults.dry,
        })
    }
}

/// Read the API token, failing with a message that names the variable.
pub fn github_token(lookup: impl Fn(&str) -> Option<String>) -> Result<String> {
    lookup(TOKEN_VAR)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| SnifferError::MissingToken(TOKEN_VAR.to_string()))
}

/// `.env` files consulted at startup, most specific first.
pub fn env_file_candidates(home: &Path) -> Vec<PathBuf> {
    vec![
        home.join(".config").join("regression-sniffer").join(".env"),
        home.join(".env.regression-sniffer"),
        home.join(".env"),
    ]
}
