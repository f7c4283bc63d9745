use serde::{Deserialize, Serialize};

/// Terminal result of one submission task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", rename_all_fields = "camelCase", tag = "status")]
pub enum JobOutcome {
    /// The platform accepted and finished the simulation.
    Submitted { alpha_id: String },
    /// The submission primitive reported an error.
    Failed { reason: String },
    /// The submission did not finish within the configured timeout.
    TimedOut,
    /// The run was cancelled before the submission finished.
    Cancelled,
}

impl JobOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, JobOutcome::Submitted { .. })
    }

    /// Short label used in log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            JobOutcome::Submitted { .. } => "submitted",
            JobOutcome::Failed { .. } => "failed",
            JobOutcome::TimedOut => "timed_out",
            JobOutcome::Cancelled => "cancelled",
        }
    }
}

/// Aggregate counters for one dispatch run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    /// Jobs excluded because the ledger already lists them.
    pub skipped: usize,
    /// Jobs launched as submission tasks.
    pub dispatched: usize,
    pub submitted: usize,
    pub failed: usize,
    pub timed_out: usize,
    pub cancelled: usize,
    /// Sessions closed during teardown.
    pub sessions_closed: usize,
    /// Highest number of submissions observed in flight at once.
    pub peak_in_flight: usize,
}

impl RunReport {
    pub fn record(&mut self, outcome: &JobOutcome) {
        match outcome {
            JobOutcome::Submitted { .. } => self.submitted += 1,
            JobOutcome::Failed { .. } => self.failed += 1,
            JobOutcome::TimedOut => self.timed_out += 1,
            JobOutcome::Cancelled => self.cancelled += 1,
        }
    }

    /// Tasks that reached a terminal state.
    pub fn finished(&self) -> usize {
        self.submitted + self.failed + self.timed_out + self.cancelled
    }

    /// `true` when every dispatched job was submitted.
    pub fn is_clean(&self) -> bool {
        self.submitted == self.dispatched
    }
}
