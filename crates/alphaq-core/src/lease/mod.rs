use std::{
    mem,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use alphaq_model::SlotIndex;
use tokio::{
    sync::{RwLock, Semaphore, SemaphorePermit},
    time::Instant,
};
use tracing::{debug, info, warn};

use crate::{error::AuthError, platform::Platform};

/// One pool slot's authenticated session, with expiry bookkeeping.
///
/// Every renewal bumps a generation counter so that concurrent tasks noticing the same
/// stale session trigger a single re-login. A replaced session is only closed once no
/// submission still holds it.
pub struct SessionLease<P: Platform> {
    slot: SlotIndex,
    ttl: Duration,
    state: RwLock<LeaseState<P::Session>>,
    /// Capacity-1 gate used when sessions must not be shared by overlapping submissions.
    gate: Semaphore,
    closed: AtomicBool,
}

struct LeaseState<S> {
    /// `None` after a renewal retired the old session and the new login failed.
    current: Option<Arc<S>>,
    created_at: Instant,
    generation: u64,
    /// Replaced sessions still referenced by in-flight submissions.
    retired: Vec<Arc<S>>,
}

impl<S> LeaseState<S> {
    fn handle(&self) -> Option<LeasedHandle<S>> {
        self.current.as_ref().map(|session| LeasedHandle {
            session: Arc::clone(session),
            generation: self.generation,
        })
    }

    fn is_fresh(&self, ttl: Duration) -> bool {
        self.current.is_some() && self.created_at.elapsed() < ttl
    }

    /// Remove and return retired sessions nobody holds any more.
    fn take_idle(&mut self) -> Vec<Arc<S>> {
        let (idle, busy): (Vec<_>, Vec<_>) = mem::take(&mut self.retired)
            .into_iter()
            .partition(|session| Arc::strong_count(session) == 1);
        self.retired = busy;
        idle
    }
}

/// Snapshot of the lease's session at the moment it was taken.
///
/// Hand it back with [`SessionLease::release`] once the submission is over.
pub struct LeasedHandle<S> {
    session: Arc<S>,
    generation: u64,
}

impl<S> LeasedHandle<S> {
    pub fn session(&self) -> &S {
        &self.session
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

impl<P: Platform> SessionLease<P> {
    /// Log in and start the lease clock.
    pub async fn acquire(platform: &P, slot: SlotIndex, ttl: Duration) -> Result<Self, AuthError> {
        let session = platform.login().await?;
        debug!(slot, platform = platform.name(), "session acquired");

        Ok(Self {
            slot,
            ttl,
            state: RwLock::new(LeaseState {
                current: Some(Arc::new(session)),
                created_at: Instant::now(),
                generation: 0,
                retired: Vec::new(),
            }),
            gate: Semaphore::new(1),
            closed: AtomicBool::new(false),
        })
    }

    pub fn slot(&self) -> SlotIndex {
        self.slot
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    pub async fn created_at(&self) -> Instant {
        self.state.read().await.created_at
    }

    pub async fn generation(&self) -> u64 {
        self.state.read().await.generation
    }

    /// `true` when the lease is past its ttl or has no live session.
    pub async fn is_expired(&self) -> bool {
        !self.state.read().await.is_fresh(self.ttl)
    }

    /// Current session, whatever its age. `None` while the lease has no live session.
    pub async fn current(&self) -> Option<LeasedHandle<P::Session>> {
        self.state.read().await.handle()
    }

    /// Current session, renewed first if the lease outlived its ttl or lost its session.
    pub async fn ensure_fresh(&self, platform: &P) -> Result<LeasedHandle<P::Session>, AuthError> {
        {
            let state = self.state.read().await;
            if state.is_fresh(self.ttl) {
                if let Some(handle) = state.handle() {
                    return Ok(handle);
                }
            }
        }

        let mut state = self.state.write().await;
        if !state.is_fresh(self.ttl) {
            info!(slot = self.slot, "session expired, logging in again");
            self.renew_locked(&mut state, platform).await?;
        }
        state.handle().ok_or(AuthError::Closed)
    }

    /// Retire the current session and log in again, unconditionally.
    pub async fn renew(&self, platform: &P) -> Result<(), AuthError> {
        let mut state = self.state.write().await;
        self.renew_locked(&mut state, platform).await
    }

    /// Renew only if the lease still holds the session of `stale_generation`.
    ///
    /// Returns `true` when this call performed the renewal.
    pub async fn refresh(&self, platform: &P, stale_generation: u64) -> Result<bool, AuthError> {
        let mut state = self.state.write().await;
        if state.generation != stale_generation {
            return Ok(false);
        }
        self.renew_locked(&mut state, platform).await?;
        Ok(true)
    }

    async fn renew_locked(
        &self,
        state: &mut LeaseState<P::Session>,
        platform: &P,
    ) -> Result<(), AuthError> {
        if self.is_closed() {
            return Err(AuthError::Closed);
        }
        if let Some(old) = state.current.take() {
            state.retired.push(old);
            state.generation += 1;
        }
        for session in state.take_idle() {
            self.close_retired(platform, &session).await;
        }

        let session = platform.login().await?;
        state.current = Some(Arc::new(session));
        state.created_at = Instant::now();
        debug!(slot = self.slot, generation = state.generation, "session renewed");
        Ok(())
    }

    /// Give back a handle obtained from this lease.
    ///
    /// A session replaced while the handle was out is closed here if this was its last user.
    pub async fn release(&self, platform: &P, handle: LeasedHandle<P::Session>) {
        drop(handle);
        let idle = self.state.write().await.take_idle();
        for session in idle {
            self.close_retired(platform, &session).await;
        }
    }

    async fn close_retired(&self, platform: &P, session: &P::Session) {
        match platform.close(session).await {
            Ok(()) => debug!(slot = self.slot, "retired session closed"),
            Err(e) => warn!(slot = self.slot, error = %e, "failed to close retired session"),
        }
    }

    /// Wait until no other submission holds this lease exclusively.
    pub async fn exclusive(&self) -> Result<SemaphorePermit<'_>, AuthError> {
        self.gate.acquire().await.map_err(|_| AuthError::Closed)
    }

    /// Release every session the lease still owns, retired ones included.
    ///
    /// Only the first call reaches the platform; later calls return `Ok(false)`.
    pub async fn close(&self, platform: &P) -> Result<bool, AuthError> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(false);
        }
        self.gate.close();

        let (current, retired) = {
            let mut state = self.state.write().await;
            (state.current.take(), mem::take(&mut state.retired))
        };
        for session in retired {
            self.close_retired(platform, &session).await;
        }
        if let Some(session) = current {
            platform.close(&session).await?;
        }
        debug!(slot = self.slot, "session closed");
        Ok(true)
    }
}
