use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::error::CoreError;

/// Run-wide bound on in-flight submissions.
///
/// Cloning is cheap; every clone shares the same permits.
#[derive(Clone, Debug)]
pub struct ConcurrencyLimiter {
    sem: Arc<Semaphore>,
    capacity: usize,
    peak: Arc<AtomicUsize>,
}

/// Proof of an acquired slot. The slot is returned when the permit is dropped,
/// whichever way the holding task ends.
#[derive(Debug)]
pub struct LimiterPermit {
    _permit: OwnedSemaphorePermit,
}

impl ConcurrencyLimiter {
    pub fn new(capacity: usize) -> Self {
        Self {
            sem: Arc::new(Semaphore::new(capacity)),
            capacity,
            peak: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Wait for a free slot.
    pub async fn acquire(&self) -> Result<LimiterPermit, CoreError> {
        let permit = Arc::clone(&self.sem)
            .acquire_owned()
            .await
            .map_err(|_| CoreError::LimiterClosed)?;

        self.peak.fetch_max(self.in_flight(), Ordering::Relaxed);
        Ok(LimiterPermit { _permit: permit })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Permits currently held.
    pub fn in_flight(&self) -> usize {
        self.capacity - self.sem.available_permits()
    }

    /// Highest number of permits observed held at once.
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::Relaxed)
    }

    /// Refuse all pending and future acquisitions.
    pub fn close(&self) {
        self.sem.close();
    }
}
