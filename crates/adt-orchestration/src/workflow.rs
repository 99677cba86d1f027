//! # Lifecycle Workflows
//!
//! The three high-level workflows:
//!
//! - create: `Validate? → Create → Lock → Update → Check? → Unlock → Activate?`
//! - update: `Lock → Update → Check? → Unlock → Activate?`
//! - delete: `Lock → Delete → (Unlock only if Delete failed)`
//!
//! Steps run strictly in sequence, each under the session returned by the
//! previous one. Once Lock has succeeded, Unlock is attempted on every path
//! before the workflow returns. Cancellation is honored between steps before
//! Lock; after Lock it waits until the lock has been released.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use adt_shared::config::CheckPolicy;
use adt_shared::{
    ErrorKind, ErrorMessage, LockHandle, ObjectDescriptor, ObjectPayload, SessionContext, Severity,
    StepName, StepOutcome, WorkflowKind, WorkflowRequest, WorkflowResult, WorkflowState,
};

use crate::error::OrchestrationResult;
use crate::executor::{StepContext, StepExecution};
use crate::lock::{LockLease, LockManager};
use crate::orchestrator::WorkflowOrchestrator;
use crate::registry::ObjectKindCapabilities;

/// Accumulates outcomes and threads the session through one invocation.
#[derive(Debug)]
struct WorkflowRun {
    workflow: WorkflowKind,
    descriptor: ObjectDescriptor,
    payload: Arc<ObjectPayload>,
    steps: Vec<StepOutcome>,
    session: SessionContext,
    lock_handle: Option<LockHandle>,
}

impl WorkflowRun {
    fn new(workflow: WorkflowKind, request: &WorkflowRequest) -> Self {
        Self {
            workflow,
            descriptor: request.descriptor.clone(),
            payload: Arc::new(request.payload.clone()),
            steps: Vec::new(),
            session: request.session.clone().unwrap_or_default(),
            lock_handle: None,
        }
    }

    fn context(&self) -> StepContext {
        StepContext::new(self.descriptor.clone(), self.payload.clone(), self.session.clone())
            .with_lock_handle(self.lock_handle.clone())
    }

    /// Record a step; returns whether it succeeded.
    fn record(&mut self, execution: StepExecution) -> bool {
        self.session = execution.session;
        if let Some(handle) = execution.lock_handle {
            self.lock_handle = Some(handle);
        }
        let success = execution.outcome.success;
        self.steps.push(execution.outcome);
        success
    }

    fn record_outcome(&mut self, outcome: StepOutcome) {
        self.steps.push(outcome);
    }

    fn last_error_kind(&self) -> Option<ErrorKind> {
        self.steps.last().and_then(StepOutcome::error_kind)
    }

    fn outcome_mut(&mut self, step: StepName) -> Option<&mut StepOutcome> {
        self.steps.iter_mut().rev().find(|o| o.step == step)
    }

    fn finish(self, state: WorkflowState, success: bool) -> WorkflowResult {
        if success {
            info!(
                workflow = %self.workflow,
                object = %self.descriptor,
                state = %state,
                steps = self.steps.len(),
                "Workflow finished"
            );
        } else {
            warn!(
                workflow = %self.workflow,
                object = %self.descriptor,
                state = %state,
                steps = self.steps.len(),
                "Workflow finished unsuccessfully"
            );
        }

        WorkflowResult {
            workflow: self.workflow,
            descriptor: self.descriptor,
            state,
            success,
            steps: self.steps,
            lock_handle: self.lock_handle,
            session: Some(self.session),
        }
    }
}

/// Optional work after Lock.
#[derive(Debug, Clone, Copy)]
struct LockedStepFlags {
    check: bool,
    activate: bool,
}

impl WorkflowOrchestrator {
    pub async fn run_create(&self, request: WorkflowRequest) -> OrchestrationResult<WorkflowResult> {
        self.run_create_with_cancel(request, CancellationToken::new()).await
    }

    pub async fn run_create_with_cancel(
        &self,
        request: WorkflowRequest,
        cancel: CancellationToken,
    ) -> OrchestrationResult<WorkflowResult> {
        let capabilities = self.registry().resolve(request.descriptor.kind())?;
        let mut run = WorkflowRun::new(WorkflowKind::Create, &request);
        info!(workflow = %run.workflow, object = %run.descriptor, "Workflow starting");

        let validate = if request.validate {
            capabilities.validate.clone()
        } else {
            None
        };
        let first_step = if validate.is_some() {
            StepName::Validate
        } else {
            StepName::Create
        };

        if let Err(state) = self.prepare(&mut run, &request, first_step, &cancel).await {
            return Ok(run.finish(state, false));
        }

        if let Some(validate) = validate {
            let execution = self.run_step(&validate, &run.context()).await;
            if !run.record(execution) {
                // Already exists: nothing to do, reported as a benign completion
                if run.last_error_kind() == Some(ErrorKind::Conflict) {
                    return Ok(run.finish(WorkflowState::Skipped, true));
                }
                return Ok(run.finish(WorkflowState::Aborted, false));
            }
            if cancel.is_cancelled() {
                return Ok(run.finish(WorkflowState::Cancelled, false));
            }
        }

        let execution = self.run_step(&capabilities.create, &run.context()).await;
        if !run.record(execution) {
            return Ok(run.finish(WorkflowState::Aborted, false));
        }
        if cancel.is_cancelled() {
            return Ok(run.finish(WorkflowState::Cancelled, false));
        }

        let flags = LockedStepFlags {
            check: request.check,
            activate: request.activate,
        };
        Ok(self.run_locked(run, &capabilities, flags, &cancel).await)
    }

    pub async fn run_update(&self, request: WorkflowRequest) -> OrchestrationResult<WorkflowResult> {
        self.run_update_with_cancel(request, CancellationToken::new()).await
    }

    pub async fn run_update_with_cancel(
        &self,
        request: WorkflowRequest,
        cancel: CancellationToken,
    ) -> OrchestrationResult<WorkflowResult> {
        let capabilities = self.registry().resolve(request.descriptor.kind())?;
        let mut run = WorkflowRun::new(WorkflowKind::Update, &request);
        info!(workflow = %run.workflow, object = %run.descriptor, "Workflow starting");

        if let Err(state) = self.prepare(&mut run, &request, StepName::Lock, &cancel).await {
            return Ok(run.finish(state, false));
        }

        let flags = LockedStepFlags {
            check: request.check,
            activate: request.activate,
        };
        Ok(self.run_locked(run, &capabilities, flags, &cancel).await)
    }

    pub async fn run_delete(&self, request: WorkflowRequest) -> OrchestrationResult<WorkflowResult> {
        self.run_delete_with_cancel(request, CancellationToken::new()).await
    }

    pub async fn run_delete_with_cancel(
        &self,
        request: WorkflowRequest,
        cancel: CancellationToken,
    ) -> OrchestrationResult<WorkflowResult> {
        let capabilities = self.registry().resolve(request.descriptor.kind())?;
        let mut run = WorkflowRun::new(WorkflowKind::Delete, &request);
        info!(workflow = %run.workflow, object = %run.descriptor, "Workflow starting");

        if let Err(state) = self.prepare(&mut run, &request, StepName::Lock, &cancel).await {
            return Ok(run.finish(state, false));
        }

        let locks = LockManager::new(&capabilities, &self.timeouts);
        let Some(lease) = self.acquire(&mut run, &locks).await else {
            return Ok(run.finish(WorkflowState::Aborted, false));
        };

        if cancel.is_cancelled() {
            info!(object = %run.descriptor, "Cancellation observed after lock, releasing");
            self.release(&mut run, &locks, lease, false).await;
            return Ok(run.finish(WorkflowState::Cancelled, false));
        }

        let execution = self.run_step(&capabilities.delete, &run.context()).await;
        if run.record(execution) {
            // The lock went away with the object
            lease.consume();
            return Ok(run.finish(WorkflowState::Completed, true));
        }

        let state = if self.release(&mut run, &locks, lease, true).await {
            WorkflowState::Failed
        } else {
            WorkflowState::CompletedWithCleanupFailure
        };
        Ok(run.finish(state, false))
    }

    /// Local descriptor checks, cancellation and session establishment.
    /// `Err` ends the workflow before any remote step with the given state;
    /// failures are recorded against `first_step`.
    async fn prepare(
        &self,
        run: &mut WorkflowRun,
        request: &WorkflowRequest,
        first_step: StepName,
        cancel: &CancellationToken,
    ) -> Result<(), WorkflowState> {
        if let Err(err) = request.descriptor.validate() {
            run.record_outcome(StepOutcome::failed(
                first_step,
                ErrorMessage::error(ErrorKind::ValidationFailed, err.to_string()),
            ));
            return Err(WorkflowState::Aborted);
        }
        if cancel.is_cancelled() {
            return Err(WorkflowState::Cancelled);
        }

        match self.establish(request.session.clone()).await {
            Ok(session) => {
                run.session = session;
                Ok(())
            }
            Err(message) => {
                run.record_outcome(StepOutcome::failed(first_step, message));
                Err(WorkflowState::Aborted)
            }
        }
    }

    async fn acquire(&self, run: &mut WorkflowRun, locks: &LockManager) -> Option<LockLease> {
        let acquisition = locks.acquire(run.context()).await;
        run.session = acquisition.session;
        run.record_outcome(acquisition.outcome);
        let lease = acquisition.lease?;
        run.lock_handle = Some(lease.handle().clone());
        Some(lease)
    }

    /// Release the lease and record Unlock. A failed release after an
    /// earlier failure gets a synthesized cleanup failure; otherwise it is
    /// downgraded to a warning. Returns whether the release succeeded.
    async fn release(
        &self,
        run: &mut WorkflowRun,
        locks: &LockManager,
        lease: LockLease,
        prior_failure: bool,
    ) -> bool {
        let release = locks.release(lease, run.session.clone()).await;
        run.session = release.session;

        let mut outcome = release.outcome;
        let released = outcome.success;
        if !released {
            if prior_failure {
                outcome.messages.push(ErrorMessage::error(
                    ErrorKind::CleanupFailure,
                    format!(
                        "lock on {} could not be released after an earlier failure",
                        run.descriptor
                    ),
                ));
            } else {
                for message in &mut outcome.messages {
                    message.severity = Severity::Warning;
                }
            }
        }
        run.record_outcome(outcome);
        released
    }

    /// Lock → Update → Check? → Unlock → Activate?
    async fn run_locked(
        &self,
        mut run: WorkflowRun,
        capabilities: &ObjectKindCapabilities,
        flags: LockedStepFlags,
        cancel: &CancellationToken,
    ) -> WorkflowResult {
        let locks = LockManager::new(capabilities, &self.timeouts);
        let Some(mut lease) = self.acquire(&mut run, &locks).await else {
            return run.finish(WorkflowState::Aborted, false);
        };

        let execution = self.run_step(&capabilities.update, &run.context()).await;
        let updated = run.record(execution);
        lease.observe(&run.session);

        let mut check_errors = false;
        if let (true, true, Some(check)) = (updated, flags.check, capabilities.check.as_ref()) {
            let execution = self.run_step(check, &run.context()).await;
            check_errors = execution.outcome.has_errors();
            run.record(execution);
            lease.observe(&run.session);
        }

        let hard_failure = !updated;
        let released = self.release(&mut run, &locks, lease, hard_failure).await;

        if hard_failure && !released {
            return run.finish(WorkflowState::CompletedWithCleanupFailure, false);
        }
        if cancel.is_cancelled() {
            info!(object = %run.descriptor, "Cancellation honored after lock release");
            return run.finish(WorkflowState::Cancelled, false);
        }
        if hard_failure {
            return run.finish(WorkflowState::Failed, false);
        }

        let Some(activate) = capabilities.activate.as_ref().filter(|_| flags.activate) else {
            return run.finish(WorkflowState::Completed, true);
        };

        if check_errors && self.check_policy == CheckPolicy::BlockActivation {
            if let Some(check) = run.outcome_mut(StepName::Check) {
                check.messages.push(ErrorMessage::warning(
                    ErrorKind::ValidationFailed,
                    "activation skipped because the check run reported errors",
                ));
            }
            return run.finish(WorkflowState::Completed, true);
        }

        let execution = self.run_step(activate, &run.context()).await;
        if run.record(execution) {
            run.finish(WorkflowState::Completed, true)
        } else {
            run.finish(WorkflowState::Failed, false)
        }
    }
}
