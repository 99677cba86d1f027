//! # Workflow Orchestrator
//!
//! Entry point for both the high-level workflows (see [`crate::workflow`])
//! and single low-level operations.
//!
//! The orchestrator holds no mutable state: sessions and lock handles live in
//! the invocation that created them. One instance is shared via `Arc` across
//! any number of concurrent workflows.

use std::sync::Arc;

use tracing::{debug, warn};

use adt_client::AdtTransport;
use adt_shared::config::{AdtConfig, CheckPolicy, TimeoutConfig};
use adt_shared::{ErrorClassifier, ErrorKind, ErrorMessage, SessionContext};

use crate::error::{OrchestrationError, OrchestrationResult};
use crate::executor::{execute_with_timeout, StepContext, StepExecution, StepExecutor};
use crate::operation::{OperationRequest, OperationResult};
use crate::registry::ObjectKindRegistry;

#[derive(Debug, Clone)]
pub struct WorkflowOrchestrator {
    transport: Arc<dyn AdtTransport>,
    registry: Arc<ObjectKindRegistry>,
    pub(crate) timeouts: TimeoutConfig,
    pub(crate) check_policy: CheckPolicy,
    classifier: ErrorClassifier,
}

impl WorkflowOrchestrator {
    pub fn new(transport: Arc<dyn AdtTransport>, registry: ObjectKindRegistry) -> Self {
        Self {
            transport,
            registry: Arc::new(registry),
            timeouts: TimeoutConfig::default(),
            check_policy: CheckPolicy::default(),
            classifier: ErrorClassifier::new(),
        }
    }

    /// Every object kind backed by the ADT REST executors over `transport`.
    pub fn with_adt_defaults(transport: Arc<dyn AdtTransport>) -> Self {
        let registry = ObjectKindRegistry::with_adt_defaults(transport.clone());
        Self::new(transport, registry)
    }

    /// Default registry plus the timeouts and check policy from `config`.
    pub fn from_config(transport: Arc<dyn AdtTransport>, config: &AdtConfig) -> Self {
        Self::with_adt_defaults(transport)
            .with_timeouts(config.timeouts.clone())
            .with_check_policy(config.workflow.check_policy)
    }

    pub fn with_timeouts(mut self, timeouts: TimeoutConfig) -> Self {
        self.timeouts = timeouts;
        self
    }

    pub fn with_check_policy(mut self, check_policy: CheckPolicy) -> Self {
        self.check_policy = check_policy;
        self
    }

    pub fn registry(&self) -> &ObjectKindRegistry {
        &self.registry
    }

    pub fn timeouts(&self) -> &TimeoutConfig {
        &self.timeouts
    }

    /// Restore `inbound` as-is, or open a fresh session.
    ///
    /// A restored session is not probed; if it has expired the first remote
    /// call reports it.
    pub async fn establish(&self, inbound: Option<SessionContext>) -> Result<SessionContext, ErrorMessage> {
        if let Some(session) = inbound {
            debug!(
                session_id = session.session_id().unwrap_or_default(),
                "Restoring caller session"
            );
            return Ok(session);
        }

        let budget = self.timeouts.connect_timeout();
        match tokio::time::timeout(budget, self.transport.connect()).await {
            Ok(Ok(session)) => Ok(session),
            Ok(Err(err)) => {
                let classification = err.classify(&self.classifier);
                warn!(kind = %classification.kind, "Session handshake failed");
                Err(ErrorMessage::error(classification.kind, classification.message))
            }
            Err(_) => {
                warn!(timeout_ms = self.timeouts.connect, "Session handshake timed out");
                Err(ErrorMessage::error(
                    ErrorKind::Unknown,
                    format!("connect timed out after {}ms", budget.as_millis()),
                ))
            }
        }
    }

    /// Run one executor under its configured budget.
    pub(crate) async fn run_step(&self, executor: &Arc<dyn StepExecutor>, ctx: &StepContext) -> StepExecution {
        let budget = self.timeouts.for_step(executor.step());
        execute_with_timeout(executor.as_ref(), ctx, budget).await
    }

    /// Issue exactly one lifecycle call.
    ///
    /// `Err` only for an unregistered kind or a verb the kind does not
    /// support; every remote failure is an unsuccessful [`OperationResult`].
    pub async fn execute_operation(&self, request: OperationRequest) -> OrchestrationResult<OperationResult> {
        let OperationRequest {
            step,
            descriptor,
            payload,
            session,
            lock_handle,
        } = request;

        let capabilities = self.registry.resolve(descriptor.kind())?;
        let executor = capabilities
            .executor(step)
            .ok_or(OrchestrationError::UnsupportedStep {
                kind: descriptor.kind(),
                step,
            })?;

        if let Err(err) = descriptor.validate() {
            return Ok(OperationResult::failed(
                step,
                ErrorMessage::error(ErrorKind::ValidationFailed, err.to_string()),
                session,
            ));
        }

        let session = match self.establish(session).await {
            Ok(session) => session,
            Err(message) => return Ok(OperationResult::failed(step, message, None)),
        };

        debug!(step = %step, object = %descriptor, "Executing single operation");
        let ctx = StepContext::new(descriptor, Arc::new(payload), session).with_lock_handle(lock_handle);
        let execution = self.run_step(executor, &ctx).await;

        Ok(OperationResult::from_outcome(
            execution.outcome,
            execution.lock_handle,
            Some(execution.session),
        ))
    }
}
