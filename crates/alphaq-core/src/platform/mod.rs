//! Seam between the scheduler and the remote simulation service.
//!
//! The scheduler never talks to the network itself; it only drives a [`Platform`]:
//! - `login` is called once per pool slot, and again whenever a lease is renewed;
//! - `submit` is called once per job, always while holding a limiter permit;
//! - `close` is called for every session the scheduler obtained.

use alphaq_model::Job;
use async_trait::async_trait;

use crate::error::{AuthError, SubmissionError};

#[async_trait]
pub trait Platform: Send + Sync + 'static {
    /// Authenticated capability returned by [`Platform::login`].
    type Session: Send + Sync + 'static;

    /// Short name used in logs.
    fn name(&self) -> &'static str;

    async fn login(&self) -> Result<Self::Session, AuthError>;

    /// Run one simulation and return the platform's identifier of the resulting alpha.
    ///
    /// Implementations are responsible for durably recording success (the completion ledger).
    async fn submit(&self, session: &Self::Session, job: &Job) -> Result<String, SubmissionError>;

    /// Release a session. Must tolerate sessions that were never used.
    async fn close(&self, session: &Self::Session) -> Result<(), AuthError>;
}
