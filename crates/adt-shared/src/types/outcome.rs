//! Step outcomes and workflow results.
//!
//! A [`WorkflowResult`] always lists every step that was attempted, in order,
//! so a caller can tell "never got past Create" from "updated but failed to
//! activate".

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::descriptor::ObjectDescriptor;
use super::lock::LockHandle;
use super::session::SessionContext;
use crate::classification::ErrorKind;
use crate::errors::AdtError;

/// Lifecycle verbs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepName {
    Validate,
    Create,
    Lock,
    Update,
    Check,
    Unlock,
    Activate,
    Delete,
}

impl StepName {
    pub const ALL: [StepName; 8] = [
        StepName::Validate,
        StepName::Create,
        StepName::Lock,
        StepName::Update,
        StepName::Check,
        StepName::Unlock,
        StepName::Activate,
        StepName::Delete,
    ];

    /// Steps with remote side effects that are never retried.
    pub fn is_mutating(self) -> bool {
        matches!(self, Self::Create | Self::Update | Self::Delete)
    }

    /// Steps that must be issued under a lock handle.
    pub fn requires_lock(self) -> bool {
        matches!(self, Self::Update | Self::Unlock | Self::Delete)
    }
}

impl fmt::Display for StepName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validate => write!(f, "validate"),
            Self::Create => write!(f, "create"),
            Self::Lock => write!(f, "lock"),
            Self::Update => write!(f, "update"),
            Self::Check => write!(f, "check"),
            Self::Unlock => write!(f, "unlock"),
            Self::Activate => write!(f, "activate"),
            Self::Delete => write!(f, "delete"),
        }
    }
}

impl FromStr for StepName {
    type Err = AdtError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        Self::ALL
            .into_iter()
            .find(|step| step.to_string().eq_ignore_ascii_case(needle))
            .ok_or_else(|| AdtError::invalid_input(format!("unknown step '{needle}'")))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warning,
}

/// One classified message attached to a step outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorMessage {
    pub kind: ErrorKind,
    pub text: String,
    pub severity: Severity,
}

impl ErrorMessage {
    pub fn error(kind: ErrorKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
            severity: Severity::Error,
        }
    }

    pub fn warning(kind: ErrorKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
            severity: Severity::Warning,
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

/// Outcome of one attempted step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepOutcome {
    pub step: StepName,
    pub success: bool,
    #[serde(default)]
    pub messages: Vec<ErrorMessage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw: Option<serde_json::Value>,
    #[serde(default)]
    pub duration_ms: u64,
}

impl StepOutcome {
    pub fn succeeded(step: StepName) -> Self {
        Self {
            step,
            success: true,
            messages: Vec::new(),
            raw: None,
            duration_ms: 0,
        }
    }

    pub fn failed(step: StepName, message: ErrorMessage) -> Self {
        Self {
            step,
            success: false,
            messages: vec![message],
            raw: None,
            duration_ms: 0,
        }
    }

    pub fn with_raw(mut self, raw: serde_json::Value) -> Self {
        self.raw = Some(raw);
        self
    }

    pub fn with_message(mut self, message: ErrorMessage) -> Self {
        self.messages.push(message);
        self
    }

    /// Kind of the first error-severity message, if any.
    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.messages.iter().find(|m| m.is_error()).map(|m| m.kind)
    }

    pub fn has_errors(&self) -> bool {
        self.messages.iter().any(ErrorMessage::is_error)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowKind {
    Create,
    Update,
    Delete,
}

impl fmt::Display for WorkflowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Create => write!(f, "create"),
            Self::Update => write!(f, "update"),
            Self::Delete => write!(f, "delete"),
        }
    }
}

/// Terminal state of a workflow invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowState {
    /// Every requested step ran
    Completed,
    /// Validation reported the object already exists; nothing was changed
    Skipped,
    /// Hard failure before a lock was held; nothing to compensate
    Aborted,
    /// Hard failure after the lock; the lock was released
    Failed,
    /// Hard failure after the lock and the release failed too
    CompletedWithCleanupFailure,
    /// Cancellation honored (after compensation when a lock was held)
    Cancelled,
}

impl fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Completed => write!(f, "completed"),
            Self::Skipped => write!(f, "skipped"),
            Self::Aborted => write!(f, "aborted"),
            Self::Failed => write!(f, "failed"),
            Self::CompletedWithCleanupFailure => write!(f, "completed_with_cleanup_failure"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Aggregate of one workflow invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowResult {
    pub workflow: WorkflowKind,
    pub descriptor: ObjectDescriptor,
    pub state: WorkflowState,
    pub success: bool,
    pub steps: Vec<StepOutcome>,
    /// Handle used during the workflow, kept for diagnostics
    pub lock_handle: Option<LockHandle>,
    /// Terminal session; `None` once detached at the external boundary
    pub session: Option<SessionContext>,
}

impl WorkflowResult {
    /// Outcome of `step`, if it was attempted.
    pub fn step(&self, step: StepName) -> Option<&StepOutcome> {
        self.steps.iter().find(|o| o.step == step)
    }

    pub fn attempted(&self, step: StepName) -> bool {
        self.step(step).is_some()
    }

    pub fn attempted_steps(&self) -> Vec<StepName> {
        self.steps.iter().map(|o| o.step).collect()
    }

    pub fn errors(&self) -> impl Iterator<Item = &ErrorMessage> {
        self.steps
            .iter()
            .flat_map(|o| o.messages.iter())
            .filter(|m| m.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &ErrorMessage> {
        self.steps
            .iter()
            .flat_map(|o| o.messages.iter())
            .filter(|m| m.severity == Severity::Warning)
    }

    pub fn has_cleanup_failure(&self) -> bool {
        self.errors().any(|m| m.kind == ErrorKind::CleanupFailure)
    }

    /// Drop the terminal session; session persistence belongs to an external
    /// broker, not to callers of the high-level workflows.
    pub fn detach_session(mut self) -> Self {
        self.session = None;
        self
    }
}
