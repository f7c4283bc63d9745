//! Mapping from HTTP status codes to the scheduler's error taxonomy.

use alphaq_core::{AuthError, SubmissionError};

pub(crate) fn submission_error(status: u16, body: String) -> SubmissionError {
    let reason = format!("status {status}: {body}");
    match status {
        401 => SubmissionError::Unauthorized(reason),
        429 | 500..=599 => SubmissionError::Transient(reason),
        _ => SubmissionError::Rejected(reason),
    }
}

pub(crate) fn auth_error(status: u16, body: String) -> AuthError {
    let reason = format!("status {status}: {body}");
    match status {
        401 | 403 => AuthError::Rejected(reason),
        _ => AuthError::Unavailable(reason),
    }
}

/// Whether a terminal simulation `status` field denotes failure.
pub(crate) fn is_failed_simulation(status: &str) -> bool {
    matches!(status.to_ascii_uppercase().as_str(), "ERROR" | "FAIL" | "FAILED")
}
