use std::{io, path::PathBuf};

use thiserror::Error;

/// Invalid run configuration; always fatal before any session is opened.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("concurrency width must be greater than zero")]
    ZeroWidth,
    #[error("job source not found: {}", .0.display())]
    MissingJobSource(PathBuf),
    #[error("invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Failure to obtain or keep an authenticated session.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("credentials rejected: {0}")]
    Rejected(String),
    #[error("platform unavailable: {0}")]
    Unavailable(String),
    #[error("session already closed")]
    Closed,
}

/// Failure reported by the submission primitive for a single job.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubmissionError {
    #[error("transient failure: {0}")]
    Transient(String),
    #[error("rejected by platform: {0}")]
    Rejected(String),
    #[error("session unauthorized: {0}")]
    Unauthorized(String),
}

impl SubmissionError {
    pub fn kind(&self) -> &'static str {
        match self {
            SubmissionError::Transient(_) => "transient",
            SubmissionError::Rejected(_) => "rejected",
            SubmissionError::Unauthorized(_) => "unauthorized",
        }
    }
}

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("failed to read ledger {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to append to ledger {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("identifier spans multiple lines: {0:?}")]
    MultilineIdentifier(String),
}

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("auth error: {0}")]
    Auth(#[from] AuthError),
    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),
    #[error("concurrency limiter closed")]
    LimiterClosed,
}
