//! Run orchestration.
//!
//! A run walks through [`RunPhase`] in order:
//! `Building → PoolReady → Dispatching → Draining → TornDown`.
//! Once the pool exists, teardown is unconditional: every lease is closed before
//! [`Dispatcher::run`] returns, whatever happened to the individual submissions.

mod config;
pub use config::{
    DEFAULT_SESSION_TTL, DEFAULT_SUBMIT_TIMEOUT, DEFAULT_WIDTH, DispatchConfig, SessionMode,
};

mod task;

#[cfg(test)]
mod tests;

use std::{fmt, sync::Arc};

use alphaq_model::{Job, JobOutcome, RunReport};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, error, info, info_span, instrument};

use crate::{
    error::{ConfigError, CoreError},
    ledger::CompletionLedger,
    limiter::ConcurrencyLimiter,
    partition::{partition, shuffle},
    platform::Platform,
    pool::WorkerPool,
};
use task::{TaskContext, submit_job};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Building,
    PoolReady,
    Dispatching,
    Draining,
    TornDown,
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RunPhase::Building => "building",
            RunPhase::PoolReady => "pool_ready",
            RunPhase::Dispatching => "dispatching",
            RunPhase::Draining => "draining",
            RunPhase::TornDown => "torn_down",
        };
        f.write_str(s)
    }
}

/// Session-affine, bounded-concurrency scheduler over a [`Platform`].
pub struct Dispatcher<P: Platform> {
    platform: Arc<P>,
    config: DispatchConfig,
}

impl<P: Platform> Dispatcher<P> {
    pub fn new(platform: Arc<P>, config: DispatchConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { platform, config })
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// Ledger-filter and shuffle `jobs`. Returns the candidates and the number skipped.
    pub fn candidates(&self, jobs: Vec<Job>, ledger: &CompletionLedger) -> (Vec<Job>, usize) {
        let total = jobs.len();
        let mut candidates = ledger.filter(jobs);
        let skipped = total - candidates.len();
        shuffle(&mut candidates, self.config.shuffle_seed);
        (candidates, skipped)
    }

    /// Submit every job not yet in `ledger` and wait for all of them.
    ///
    /// Only configuration and pool-construction failures are returned as errors;
    /// individual submission failures are counted in the [`RunReport`].
    #[instrument(
        name = "dispatch",
        level = "info",
        skip_all,
        fields(run_id = %uuid::Uuid::new_v4(), platform = self.platform.name(), width = self.config.width.get())
    )]
    pub async fn run(
        &self,
        jobs: Vec<Job>,
        ledger: &CompletionLedger,
        cancel: CancellationToken,
    ) -> Result<RunReport, CoreError> {
        let width = self.config.width;

        let (candidates, skipped) = self.candidates(jobs, ledger);
        info!(phase = %RunPhase::Building, candidates = candidates.len(), skipped, "candidate list built");

        let pool = WorkerPool::build(&*self.platform, width, self.config.session_ttl).await?;
        info!(phase = %RunPhase::PoolReady, sessions = pool.width(), "session pool ready");

        let mut report = RunReport {
            skipped,
            dispatched: candidates.len(),
            ..Default::default()
        };

        let limiter = ConcurrencyLimiter::new(width.get());
        let mut tasks = JoinSet::new();
        for (chunk, lease) in partition(candidates, width).into_iter().zip(pool.leases()) {
            let span = info_span!("slot", slot = lease.slot());
            for job in chunk {
                let ctx = TaskContext {
                    platform: Arc::clone(&self.platform),
                    lease: Arc::clone(lease),
                    limiter: limiter.clone(),
                    mode: self.config.session_mode,
                    timeout: self.config.submit_timeout,
                    cancel: cancel.child_token(),
                };
                tasks.spawn(submit_job(ctx, job).instrument(span.clone()));
            }
        }
        info!(phase = %RunPhase::Dispatching, tasks = tasks.len(), "submission tasks launched");

        info!(phase = %RunPhase::Draining, "waiting for submissions");
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((_, outcome)) => report.record(&outcome),
                Err(e) => {
                    error!(error = %e, "submission task aborted");
                    report.record(&JobOutcome::Failed {
                        reason: format!("task aborted: {e}"),
                    });
                }
            }
        }

        report.peak_in_flight = limiter.peak();
        report.sessions_closed = pool.teardown(&*self.platform).await;
        info!(
            phase = %RunPhase::TornDown,
            submitted = report.submitted,
            failed = report.failed,
            timed_out = report.timed_out,
            cancelled = report.cancelled,
            peak_in_flight = report.peak_in_flight,
            "run finished"
        );
        Ok(report)
    }
}
