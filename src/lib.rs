//! # adt-core
//!
//! Facade over the workspace crates:
//!
//! - [`shared`]: session context, descriptors, outcomes, error classification,
//!   configuration and logging
//! - [`client`]: the session-aware transport
//! - [`orchestration`]: lock manager, step executors, registry and the
//!   workflow orchestrator
//!
//! The MCP server lives in the `adt-mcp` crate and binary.

pub use adt_client as client;
pub use adt_orchestration as orchestration;
pub use adt_shared as shared;

pub use adt_orchestration::{CancellationToken, ObjectKindRegistry, WorkflowOrchestrator};
pub use adt_shared::{
    ErrorKind, ObjectDescriptor, ObjectKind, ObjectPayload, SessionContext, StepName, WorkflowRequest,
    WorkflowResult, WorkflowState,
};
