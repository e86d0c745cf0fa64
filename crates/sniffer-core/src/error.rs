//! Error taxonomy for the backport correlation engine.
//!
//! Empty results (no backports, no related commits, no pull request) are not
//! errors; they surface as empty sequences or `None`.

/// Errors produced by the core and its collaborators.
#[derive(Debug, thiserror::Error)]
pub enum SnifferError {
    /// The repository log could not be queried. Fatal for the whole run.
    #[error("git error: {0}")]
    Git(String),

    /// Repository coordinates were not of the form `owner/repo`.
    #[error("invalid repository '{0}': expected <owner>/<repo>")]
    InvalidRepository(String),

    /// A required repository coordinate or option is missing.
    #[error("missing configuration: {0}")]
    MissingConfig(String),

    /// A required credential is missing from the environment.
    #[error(
        "{0} not set.\nPlease set the {0} environment variable in \
         '~/.config/regression-sniffer/.env' or '~/.env.regression-sniffer' or '~/.env.'"
    )]
    MissingToken(String),

    /// A pull-request or comment lookup failed.
    #[error("lookup error: {0}")]
    Lookup(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, SnifferError>;
