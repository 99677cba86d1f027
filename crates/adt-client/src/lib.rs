//! # adt-client
//!
//! Session-aware transport for ADT REST endpoints.
//!
//! The [`AdtTransport`] trait is the only thing the orchestrator depends on.
//! [`HttpTransport`] is the production implementation; with the `test-utils`
//! feature, [`testing::ScriptedTransport`] provides an in-memory stand-in that
//! records every call and the session it carried.

pub mod error;
pub mod http;
pub mod request;
#[cfg(any(test, feature = "test-utils"))]
pub mod testing;
pub mod transport;

pub use error::{ClientError, ClientResult};
pub use http::HttpTransport;
pub use request::{HttpMethod, RemoteRequest, RemoteResponse};
pub use transport::AdtTransport;
