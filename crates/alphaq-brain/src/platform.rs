use std::{
    sync::atomic::{AtomicU64, Ordering},
    time::Duration,
};

use alphaq_core::{AuthError, LedgerAppender, Platform, SubmissionError};
use alphaq_model::{Job, SimulationRequest};
use async_trait::async_trait;
use reqwest::{
    Client, Response,
    header::{HeaderMap, LOCATION, RETRY_AFTER},
};
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use crate::{config::BrainConfig, errors::BrainError, status::is_failed_simulation};

/// Authenticated client; the session cookie lives in the client's cookie store.
#[derive(Debug)]
pub struct BrainSession {
    id: u64,
    client: Client,
}

impl BrainSession {
    /// Process-local number, for logs only.
    pub fn id(&self) -> u64 {
        self.id
    }
}

#[derive(Debug, Deserialize)]
struct SimulationProgress {
    #[serde(default)]
    alpha: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

pub struct BrainPlatform {
    config: BrainConfig,
    ledger: Option<LedgerAppender>,
    sessions: AtomicU64,
}

impl BrainPlatform {
    pub fn new(config: BrainConfig) -> Self {
        Self {
            config,
            ledger: None,
            sessions: AtomicU64::new(0),
        }
    }

    /// Record every successfully simulated expression in `ledger`.
    pub fn with_ledger(mut self, ledger: LedgerAppender) -> Self {
        self.ledger = Some(ledger);
        self
    }

    pub fn config(&self) -> &BrainConfig {
        &self.config
    }

    fn client(&self) -> Result<Client, BrainError> {
        Ok(Client::builder()
            .cookie_store(true)
            .timeout(self.config.request_timeout)
            .build()?)
    }

    async fn start_simulation(&self, client: &Client, job: &Job) -> Result<String, BrainError> {
        let response = client
            .post(self.config.url("simulations"))
            .json(&SimulationRequest::from(job))
            .send()
            .await?;
        let response = ensure_success(response).await?;

        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| BrainError::InvalidResponse("simulation accepted without Location".into()))?;
        Ok(self.config.resolve(location))
    }

    async fn wait_for_alpha(&self, client: &Client, progress_url: &str) -> Result<String, BrainError> {
        loop {
            let response = ensure_success(client.get(progress_url).send().await?).await?;

            if let Some(wait) = retry_after(response.headers(), self.config.poll_interval) {
                debug!(wait_ms = wait.as_millis() as u64, "simulation in progress");
                tokio::time::sleep(wait).await;
                continue;
            }

            let body = response.text().await?;
            let progress: SimulationProgress = serde_json::from_str(&body).map_err(|e| {
                BrainError::InvalidResponse(format!("failed to parse progress: {e}, body: {body}"))
            })?;

            if let Some(status) = progress.status.as_deref() {
                if is_failed_simulation(status) {
                    let message = progress.message.unwrap_or_default();
                    return Err(BrainError::SimulationFailed(format!("{status}: {message}")));
                }
            }
            return progress.alpha.ok_or_else(|| {
                BrainError::InvalidResponse(format!("simulation finished without an alpha id: {body}"))
            });
        }
    }

    async fn tag_alpha(&self, client: &Client, alpha_id: &str, job: &Job) -> Result<(), BrainError> {
        if job.tags().is_empty() {
            return Ok(());
        }
        let response = client
            .patch(self.config.url(&format!("alphas/{alpha_id}")))
            .json(&serde_json::json!({ "tags": job.tags() }))
            .send()
            .await?;
        ensure_success(response).await?;
        Ok(())
    }

    async fn simulate(&self, session: &BrainSession, job: &Job) -> Result<String, BrainError> {
        let progress_url = self.start_simulation(&session.client, job).await?;
        debug!(progress = %progress_url, "simulation accepted");

        let alpha_id = self.wait_for_alpha(&session.client, &progress_url).await?;

        if let Err(e) = self.tag_alpha(&session.client, &alpha_id, job).await {
            warn!(alpha_id = %alpha_id, error = %e, "failed to tag alpha");
        }
        if let Some(ledger) = &self.ledger {
            ledger.append(job.id()).await?;
        }
        Ok(alpha_id)
    }
}

#[async_trait]
impl Platform for BrainPlatform {
    type Session = BrainSession;

    fn name(&self) -> &'static str {
        "brain"
    }

    #[instrument(level = "debug", skip_all)]
    async fn login(&self) -> Result<BrainSession, AuthError> {
        let client = self.client()?;
        let creds = &self.config.credentials;

        let response = client
            .post(self.config.url("authentication"))
            .basic_auth(&creds.username, Some(&creds.password))
            .send()
            .await
            .map_err(BrainError::from)?;
        ensure_success(response).await?;

        let id = self.sessions.fetch_add(1, Ordering::Relaxed);
        debug!(session = id, "logged in");
        Ok(BrainSession { id, client })
    }

    #[instrument(level = "debug", skip_all, fields(session = session.id, job = %job.id()))]
    async fn submit(&self, session: &BrainSession, job: &Job) -> Result<String, SubmissionError> {
        Ok(self.simulate(session, job).await?)
    }

    #[instrument(level = "debug", skip_all, fields(session = session.id))]
    async fn close(&self, session: &BrainSession) -> Result<(), AuthError> {
        let response = session
            .client
            .delete(self.config.url("authentication"))
            .send()
            .await
            .map_err(BrainError::from)?;
        ensure_success(response).await?;
        Ok(())
    }
}

async fn ensure_success(response: Response) -> Result<Response, BrainError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(BrainError::Status {
        status: status.as_u16(),
        body,
    })
}

/// Time to wait before polling again, or `None` when the simulation has settled.
///
/// A header that is present but unreadable still means "not done yet".
fn retry_after(headers: &HeaderMap, fallback: Duration) -> Option<Duration> {
    let value = headers.get(RETRY_AFTER)?;
    let Ok(raw) = value.to_str() else {
        return Some(fallback);
    };
    match raw.trim().parse::<f64>() {
        Ok(secs) if secs > 0.0 => Some(Duration::try_from_secs_f64(secs).unwrap_or(fallback)),
        Ok(_) => None,
        Err(_) => Some(fallback),
    }
}
