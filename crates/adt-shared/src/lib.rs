//! # adt-shared
//!
//! Shared building blocks for ADT development-object lifecycle workflows:
//!
//! - [`types`]: session context, object descriptors, lock handles, step
//!   outcomes and workflow results
//! - [`classification`]: the remote error classifier and its closed taxonomy
//! - [`config`]: layered configuration (defaults, TOML file, environment)
//! - [`logging`]: tracing subscriber setup for binaries

pub mod classification;
pub mod config;
pub mod errors;
pub mod logging;
pub mod types;
pub mod xml;

pub use classification::{Classification, ErrorClassifier, ErrorKind};
pub use errors::{AdtError, AdtResult};
pub use types::*;
