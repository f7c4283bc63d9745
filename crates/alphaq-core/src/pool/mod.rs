use std::{num::NonZeroUsize, sync::Arc, time::Duration};

use tracing::{info, instrument, warn};

use crate::{error::AuthError, lease::SessionLease, platform::Platform};

/// Fixed set of leases, one per slot, created before any job is dispatched.
pub struct WorkerPool<P: Platform> {
    leases: Vec<Arc<SessionLease<P>>>,
}

impl<P: Platform> WorkerPool<P> {
    /// Log in `width` times, sequentially.
    ///
    /// If any login fails the leases created so far are closed before the error is returned.
    #[instrument(level = "debug", skip(platform), fields(platform = platform.name()))]
    pub async fn build(platform: &P, width: NonZeroUsize, ttl: Duration) -> Result<Self, AuthError> {
        let mut pool = Self {
            leases: Vec::with_capacity(width.get()),
        };

        for slot in 0..width.get() {
            match SessionLease::acquire(platform, slot, ttl).await {
                Ok(lease) => pool.leases.push(Arc::new(lease)),
                Err(e) => {
                    warn!(slot, error = %e, "login failed; tearing down partial pool");
                    pool.teardown(platform).await;
                    return Err(e);
                }
            }
        }

        info!(width = width.get(), "session pool ready");
        Ok(pool)
    }

    pub fn width(&self) -> usize {
        self.leases.len()
    }

    pub fn lease(&self, slot: usize) -> Option<&Arc<SessionLease<P>>> {
        self.leases.get(slot)
    }

    pub fn leases(&self) -> &[Arc<SessionLease<P>>] {
        &self.leases
    }

    /// Close every lease. Failures are logged and never escalated.
    ///
    /// Returns the number of sessions this call issued a close for.
    pub async fn teardown(self, platform: &P) -> usize {
        let mut closed = 0;
        for lease in &self.leases {
            match lease.close(platform).await {
                Ok(true) => closed += 1,
                Ok(false) => {}
                Err(e) => {
                    closed += 1;
                    warn!(slot = lease.slot(), error = %e, "failed to close session");
                }
            }
        }
        info!(closed, "session pool torn down");
        closed
    }
}
