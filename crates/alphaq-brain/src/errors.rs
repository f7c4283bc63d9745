use alphaq_core::{AuthError, LedgerError, SubmissionError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BrainError {
    #[error("http request failed: {0}")]
    HttpRequest(#[from] reqwest::Error),

    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("simulation failed: {0}")]
    SimulationFailed(String),

    #[error("ledger append failed: {0}")]
    Ledger(#[from] LedgerError),
}

impl From<BrainError> for SubmissionError {
    fn from(err: BrainError) -> Self {
        match err {
            BrainError::HttpRequest(e) => SubmissionError::Transient(e.to_string()),
            BrainError::Status { status, body } => crate::status::submission_error(status, body),
            BrainError::InvalidResponse(msg) => SubmissionError::Rejected(msg),
            BrainError::SimulationFailed(msg) => SubmissionError::Rejected(msg),
            BrainError::Ledger(e) => SubmissionError::Transient(e.to_string()),
        }
    }
}

impl From<BrainError> for AuthError {
    fn from(err: BrainError) -> Self {
        match err {
            BrainError::Status { status, body } => crate::status::auth_error(status, body),
            other => AuthError::Unavailable(other.to_string()),
        }
    }
}
