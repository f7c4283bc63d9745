//! In-memory platform used by the dispatcher tests.
//!
//! Sessions are numbered in login order, so with no renewals session `i` belongs to slot `i`.

use std::{
    collections::{HashMap, HashSet},
    sync::{
        Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use crate::{AuthError, LedgerAppender, Platform, SubmissionError};
use alphaq_model::Job;
use async_trait::async_trait;

#[derive(Debug)]
pub struct FakeSession {
    pub id: usize,
}

#[derive(Default)]
pub struct FakePlatform {
    submit_delay: Duration,
    delays: HashMap<String, Duration>,
    fail_login_at: Option<usize>,
    fail_logins_from: Option<usize>,
    transient: HashSet<String>,
    unauthorized: HashSet<String>,
    hang: HashSet<String>,
    ledger: Option<LedgerAppender>,

    logins: AtomicUsize,
    closes: Mutex<HashMap<usize, usize>>,
    submitted: Mutex<Vec<(usize, String)>>,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    session_in_flight: Mutex<HashMap<usize, usize>>,
    session_peak: AtomicUsize,
}

impl FakePlatform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.submit_delay = delay;
        self
    }

    /// Override the submit delay for one expression.
    pub fn with_delay_for(mut self, expr: &str, delay: Duration) -> Self {
        self.delays.insert(expr.to_string(), delay);
        self
    }

    pub fn failing_login_at(mut self, attempt: usize) -> Self {
        self.fail_login_at = Some(attempt);
        self
    }

    /// Every login from the `attempt`-th on is rejected.
    pub fn failing_logins_from(mut self, attempt: usize) -> Self {
        self.fail_logins_from = Some(attempt);
        self
    }

    pub fn transient_on(mut self, expr: &str) -> Self {
        self.transient.insert(expr.to_string());
        self
    }

    pub fn unauthorized_on(mut self, expr: &str) -> Self {
        self.unauthorized.insert(expr.to_string());
        self
    }

    pub fn hanging_on(mut self, expr: &str) -> Self {
        self.hang.insert(expr.to_string());
        self
    }

    pub fn recording_to(mut self, ledger: LedgerAppender) -> Self {
        self.ledger = Some(ledger);
        self
    }

    pub fn logins(&self) -> usize {
        self.logins.load(Ordering::SeqCst)
    }

    /// Close calls per session id.
    pub fn closes(&self) -> HashMap<usize, usize> {
        self.closes.lock().unwrap().clone()
    }

    /// `(session id, expression)` of every submission that reached the platform.
    pub fn submitted(&self) -> Vec<(usize, String)> {
        self.submitted.lock().unwrap().clone()
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    /// Highest number of overlapping submissions observed on any single session.
    pub fn session_peak(&self) -> usize {
        self.session_peak.load(Ordering::SeqCst)
    }

    fn enter(&self, session: usize) {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        let mut per = self.session_in_flight.lock().unwrap();
        let count = per.entry(session).or_default();
        *count += 1;
        self.session_peak.fetch_max(*count, Ordering::SeqCst);
    }

    fn leave(&self, session: usize) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        if let Some(count) = self.session_in_flight.lock().unwrap().get_mut(&session) {
            *count -= 1;
        }
    }
}

/// Decrements the in-flight counters even when the submit future is dropped mid-call.
struct InFlight<'a> {
    platform: &'a FakePlatform,
    session: usize,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.platform.leave(self.session);
    }
}

#[async_trait]
impl Platform for FakePlatform {
    type Session = FakeSession;

    fn name(&self) -> &'static str {
        "fake"
    }

    async fn login(&self) -> Result<FakeSession, AuthError> {
        let id = self.logins.fetch_add(1, Ordering::SeqCst);
        if Some(id) == self.fail_login_at || self.fail_logins_from.is_some_and(|from| id >= from) {
            return Err(AuthError::Rejected("invalid credentials".into()));
        }
        Ok(FakeSession { id })
    }

    async fn submit(&self, session: &FakeSession, job: &Job) -> Result<String, SubmissionError> {
        self.enter(session.id);
        let _guard = InFlight {
            platform: self,
            session: session.id,
        };
        self.submitted
            .lock()
            .unwrap()
            .push((session.id, job.expression().to_string()));

        if self.hang.contains(job.expression()) {
            tokio::time::sleep(Duration::from_secs(24 * 60 * 60)).await;
        } else {
            let delay = self.delays.get(job.expression()).copied().unwrap_or(self.submit_delay);
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }

        if self.closes.lock().unwrap().contains_key(&session.id) {
            return Err(SubmissionError::Unauthorized("session logged out".into()));
        }

        if self.transient.contains(job.expression()) {
            return Err(SubmissionError::Transient("simulation queue full".into()));
        }
        if self.unauthorized.contains(job.expression()) {
            return Err(SubmissionError::Unauthorized("session expired".into()));
        }
        if let Some(ledger) = &self.ledger {
            ledger
                .append(job.id())
                .await
                .map_err(|e| SubmissionError::Transient(e.to_string()))?;
        }
        Ok(format!("alpha-{}-{}", session.id, job.expression()))
    }

    async fn close(&self, session: &FakeSession) -> Result<(), AuthError> {
        *self.closes.lock().unwrap().entry(session.id).or_default() += 1;
        Ok(())
    }
}

pub fn jobs(exprs: &[&str]) -> Vec<Job> {
    exprs.iter().map(|e| Job::new(*e)).collect()
}

pub fn numbered_jobs(n: usize) -> Vec<Job> {
    (0..n).map(|i| Job::new(format!("rank(field_{i})"))).collect()
}
