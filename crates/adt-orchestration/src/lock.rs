//! # Lock Manager
//!
//! Acquire and release of the exclusive edit lock on one object.
//!
//! Every successful acquire yields a [`LockLease`]. The orchestrator hands
//! the lease back to [`LockManager::release`] on every path after Lock. If a
//! lease is dropped while still armed (the workflow future itself was dropped
//! mid-flight), the lease spawns a best-effort Unlock on the current runtime.
//! Release is attempted once and never retried.

use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};

use adt_shared::config::TimeoutConfig;
use adt_shared::{LockHandle, SessionContext, StepName, StepOutcome};

use crate::executor::{execute_with_timeout, StepContext, StepExecutor};
use crate::registry::ObjectKindCapabilities;

#[derive(Debug, Clone)]
pub struct LockManager {
    lock: Arc<dyn StepExecutor>,
    unlock: Arc<dyn StepExecutor>,
    lock_timeout: Duration,
    unlock_timeout: Duration,
}

/// Result of [`LockManager::acquire`].
#[derive(Debug)]
pub struct LockAcquisition {
    pub outcome: StepOutcome,
    pub session: SessionContext,
    /// Present exactly when `outcome.success`
    pub lease: Option<LockLease>,
}

/// Result of [`LockManager::release`].
#[derive(Debug)]
pub struct LockRelease {
    pub outcome: StepOutcome,
    pub session: SessionContext,
}

impl LockManager {
    pub fn new(capabilities: &ObjectKindCapabilities, timeouts: &TimeoutConfig) -> Self {
        Self {
            lock: capabilities.lock.clone(),
            unlock: capabilities.unlock.clone(),
            lock_timeout: timeouts.for_step(StepName::Lock),
            unlock_timeout: timeouts.for_step(StepName::Unlock),
        }
    }

    pub async fn acquire(&self, ctx: StepContext) -> LockAcquisition {
        let execution = execute_with_timeout(self.lock.as_ref(), &ctx, self.lock_timeout).await;

        let lease = match (execution.outcome.success, execution.lock_handle) {
            (true, Some(handle)) => {
                info!(
                    object = %ctx.descriptor,
                    session_id = execution.session.session_id().unwrap_or_default(),
                    "Lock acquired"
                );
                Some(LockLease {
                    handle,
                    ctx: ctx.with_session(execution.session.clone()),
                    unlock: self.unlock.clone(),
                    unlock_timeout: self.unlock_timeout,
                    armed: true,
                })
            }
            _ => None,
        };

        LockAcquisition {
            outcome: execution.outcome,
            session: execution.session,
            lease,
        }
    }

    /// Release `lease` under `session`, the latest session of the workflow.
    pub async fn release(&self, mut lease: LockLease, session: SessionContext) -> LockRelease {
        lease.disarm();
        let ctx = lease
            .ctx
            .clone()
            .with_session(session)
            .with_lock_handle(Some(lease.handle.clone()));

        let execution = execute_with_timeout(self.unlock.as_ref(), &ctx, self.unlock_timeout).await;
        if execution.outcome.success {
            info!(object = %ctx.descriptor, "Lock released");
        } else {
            warn!(
                object = %ctx.descriptor,
                kind = ?execution.outcome.error_kind(),
                "Lock release failed"
            );
        }

        LockRelease {
            outcome: execution.outcome,
            session: execution.session,
        }
    }
}

/// An acquired lock that must be released.
#[derive(Debug)]
pub struct LockLease {
    handle: LockHandle,
    /// Context of the most recent step, used by the drop path
    ctx: StepContext,
    unlock: Arc<dyn StepExecutor>,
    unlock_timeout: Duration,
    armed: bool,
}

impl LockLease {
    pub fn handle(&self) -> &LockHandle {
        &self.handle
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// Track the latest session so a drop-path release replays current
    /// cookies and token.
    pub fn observe(&mut self, session: &SessionContext) {
        self.ctx.session = session.clone();
    }

    /// The lock went away with the object (successful delete).
    pub fn consume(mut self) -> LockHandle {
        self.disarm();
        self.handle.clone()
    }

    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for LockLease {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        warn!(
            object = %self.ctx.descriptor,
            "Lock lease dropped while held, releasing in background"
        );

        let ctx = self
            .ctx
            .clone()
            .with_lock_handle(Some(self.handle.clone()));
        let unlock = self.unlock.clone();
        let budget = self.unlock_timeout;

        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                runtime.spawn(async move {
                    let execution = execute_with_timeout(unlock.as_ref(), &ctx, budget).await;
                    if !execution.outcome.success {
                        error!(
                            object = %ctx.descriptor,
                            kind = ?execution.outcome.error_kind(),
                            "Background lock release failed"
                        );
                    }
                });
            }
            Err(_) => {
                error!(
                    object = %self.ctx.descriptor,
                    lock_handle = self.handle.value(),
                    "No runtime available, lock was not released"
                );
            }
        }
    }
}
