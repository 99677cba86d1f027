//! Low-level single-call operation types.

use bon::Builder;
use serde::Serialize;

use adt_shared::{
    ErrorKind, ErrorMessage, LockHandle, ObjectDescriptor, ObjectPayload, SessionContext, StepName,
    StepOutcome,
};

/// One lifecycle verb against one object, with the session passed
/// explicitly in and out.
#[derive(Debug, Clone, Builder)]
pub struct OperationRequest {
    pub step: StepName,
    pub descriptor: ObjectDescriptor,
    #[builder(default)]
    pub payload: ObjectPayload,
    /// Session to issue the call under; a fresh one is established if absent
    pub session: Option<SessionContext>,
    /// Required by Update, Unlock and Delete
    pub lock_handle: Option<LockHandle>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OperationResult {
    pub step: StepName,
    pub success: bool,
    /// Step-specific data (lock handle for Lock, finding counts for Check)
    pub data: Option<serde_json::Value>,
    pub error_kind: Option<ErrorKind>,
    pub messages: Vec<ErrorMessage>,
    pub lock_handle: Option<LockHandle>,
    /// Session after the call; `None` only when no session could be
    /// established
    pub session: Option<SessionContext>,
}

impl OperationResult {
    pub(crate) fn from_outcome(
        outcome: StepOutcome,
        lock_handle: Option<LockHandle>,
        session: Option<SessionContext>,
    ) -> Self {
        Self {
            step: outcome.step,
            success: outcome.success,
            error_kind: outcome.error_kind(),
            data: outcome.raw,
            messages: outcome.messages,
            lock_handle,
            session,
        }
    }

    pub(crate) fn failed(step: StepName, message: ErrorMessage, session: Option<SessionContext>) -> Self {
        Self::from_outcome(StepOutcome::failed(step, message), None, session)
    }
}
