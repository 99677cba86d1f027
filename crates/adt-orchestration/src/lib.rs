//! # adt-orchestration
//!
//! Stateful multi-step lifecycle workflows for ADT development objects.
//!
//! A [`WorkflowOrchestrator`] drives the create, update and delete workflows
//! for any registered [`adt_shared::ObjectKind`]. Each verb is carried out by
//! a [`StepExecutor`] looked up in the [`ObjectKindRegistry`]; the
//! [`LockManager`] guarantees that a lock, once acquired, is released on
//! every path out of a workflow.
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use adt_client::HttpTransport;
//! use adt_orchestration::WorkflowOrchestrator;
//! use adt_shared::config::AdtConfig;
//! use adt_shared::{ObjectDescriptor, ObjectKind, ObjectPayload, WorkflowRequest};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AdtConfig::load()?;
//! let transport = Arc::new(HttpTransport::from_config(&config.connection, &config.timeouts)?);
//! let orchestrator = WorkflowOrchestrator::from_config(transport, &config);
//!
//! let request = WorkflowRequest::builder()
//!     .descriptor(ObjectDescriptor::new(ObjectKind::Class, "zcl_demo").with_package("$tmp"))
//!     .payload(ObjectPayload::default().with_description("Demo class"))
//!     .build();
//! let result = orchestrator.run_create(request).await?;
//! println!("{} -> {}", result.descriptor, result.state);
//! # Ok(())
//! # }
//! ```

pub mod endpoints;
pub mod error;
pub mod executor;
pub mod lock;
pub mod operation;
pub mod orchestrator;
pub mod registry;
pub mod response;
pub mod workflow;

pub use error::{OrchestrationError, OrchestrationResult};
pub use executor::{execute_with_timeout, AdtStepExecutor, StepContext, StepExecution, StepExecutor};
pub use lock::{LockAcquisition, LockLease, LockManager, LockRelease};
pub use operation::{OperationRequest, OperationResult};
pub use orchestrator::WorkflowOrchestrator;
pub use registry::{ObjectKindCapabilities, ObjectKindRegistry};

pub use tokio_util::sync::CancellationToken;
