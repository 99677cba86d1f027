//! Core data model: sessions, descriptors, lock handles, outcomes.

mod descriptor;
mod lock;
mod outcome;
mod request;
mod session;

pub use descriptor::{ObjectDescriptor, ObjectKind};
pub use lock::LockHandle;
pub use outcome::{
    ErrorMessage, Severity, StepName, StepOutcome, WorkflowKind, WorkflowResult, WorkflowState,
};
pub use request::{ObjectPayload, WorkflowRequest};
pub use session::SessionContext;
