//! Orchestrator errors.
//!
//! Remote failures never surface here: they are step outcomes. These are the
//! programming and configuration errors that stop a workflow before it starts.

use adt_shared::{AdtError, ObjectKind, StepName};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OrchestrationError {
    #[error("No capabilities registered for object kind: {0}")]
    UnknownObjectKind(String),

    #[error("Object kind {kind} does not support {step}")]
    UnsupportedStep { kind: ObjectKind, step: StepName },

    #[error(transparent)]
    Shared(#[from] AdtError),
}

impl OrchestrationError {
    pub fn unknown_kind(kind: impl Into<String>) -> Self {
        Self::UnknownObjectKind(kind.into())
    }
}

pub type OrchestrationResult<T> = Result<T, OrchestrationError>;
