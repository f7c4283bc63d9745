use std::{sync::Arc, time::Duration};

use alphaq_model::{Job, JobId, JobOutcome};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::{
    dispatch::config::SessionMode,
    error::SubmissionError,
    lease::{LeasedHandle, SessionLease},
    limiter::ConcurrencyLimiter,
    platform::Platform,
};

/// Everything one submission task needs besides its job.
pub(crate) struct TaskContext<P: Platform> {
    pub platform: Arc<P>,
    pub lease: Arc<SessionLease<P>>,
    pub limiter: ConcurrencyLimiter,
    pub mode: SessionMode,
    pub timeout: Duration,
    pub cancel: CancellationToken,
}

/// Submit one job through its slot's lease.
///
/// The limiter permit (and the session gate in exclusive mode) is held for the duration of the
/// remote call and released on every exit path, including cancellation and timeout. The session
/// handle is handed back to the lease afterwards so a session renewed meanwhile can be closed.
pub(crate) async fn submit_job<P: Platform>(ctx: TaskContext<P>, job: Job) -> (JobId, JobOutcome) {
    let slot = ctx.lease.slot();
    let outcome = run(&ctx, &job).await;

    match &outcome {
        JobOutcome::Submitted { alpha_id } => {
            info!(slot, job = %job.id(), alpha_id = %alpha_id, "simulation submitted")
        }
        JobOutcome::Failed { reason } => {
            error!(slot, job = %job.id(), reason = %reason, "simulation failed")
        }
        JobOutcome::TimedOut => {
            warn!(slot, job = %job.id(), timeout_ms = ctx.timeout.as_millis() as u64, "simulation timed out")
        }
        JobOutcome::Cancelled => debug!(slot, job = %job.id(), "simulation cancelled"),
    }

    (job.id().clone(), outcome)
}

async fn run<P: Platform>(ctx: &TaskContext<P>, job: &Job) -> JobOutcome {
    if ctx.cancel.is_cancelled() {
        return JobOutcome::Cancelled;
    }

    let _gate = match ctx.mode {
        SessionMode::Shared => None,
        SessionMode::Exclusive => tokio::select! {
            biased;
            _ = ctx.cancel.cancelled() => return JobOutcome::Cancelled,
            gate = ctx.lease.exclusive() => match gate {
                Ok(gate) => Some(gate),
                Err(e) => return failed(format!("session unavailable: {e}")),
            },
        },
    };

    let _permit = tokio::select! {
        biased;
        _ = ctx.cancel.cancelled() => return JobOutcome::Cancelled,
        permit = ctx.limiter.acquire() => match permit {
            Ok(permit) => permit,
            Err(e) => return failed(e.to_string()),
        },
    };

    let handle = match ctx.lease.ensure_fresh(&ctx.platform).await {
        Ok(handle) => handle,
        Err(e) => return failed(format!("session renewal failed: {e}")),
    };

    let outcome = attempt(ctx, job, &handle).await;
    ctx.lease.release(&ctx.platform, handle).await;
    outcome
}

async fn attempt<P: Platform>(
    ctx: &TaskContext<P>,
    job: &Job,
    handle: &LeasedHandle<P::Session>,
) -> JobOutcome {
    let call = tokio::time::timeout(ctx.timeout, ctx.platform.submit(handle.session(), job));
    let result = tokio::select! {
        biased;
        _ = ctx.cancel.cancelled() => return JobOutcome::Cancelled,
        result = call => result,
    };

    match result {
        Err(_elapsed) => JobOutcome::TimedOut,
        Ok(Ok(alpha_id)) => JobOutcome::Submitted { alpha_id },
        Ok(Err(e @ SubmissionError::Unauthorized(_))) => {
            match ctx.lease.refresh(&ctx.platform, handle.generation()).await {
                Ok(true) => info!(slot = ctx.lease.slot(), "session renewed after unauthorized response"),
                Ok(false) => {}
                Err(renew) => warn!(slot = ctx.lease.slot(), error = %renew, "session renewal failed"),
            }
            failed(e.to_string())
        }
        Ok(Err(e)) => {
            debug!(kind = e.kind(), "submission primitive reported an error");
            failed(e.to_string())
        }
    }
}

#[inline]
fn failed(reason: String) -> JobOutcome {
    JobOutcome::Failed { reason }
}
