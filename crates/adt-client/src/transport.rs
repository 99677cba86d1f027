//! The transport seam between the orchestrator and the remote system.

use async_trait::async_trait;

use adt_shared::SessionContext;

use crate::error::ClientResult;
use crate::request::{RemoteRequest, RemoteResponse};

/// Executes remote calls under an explicit session.
///
/// Implementations hold no session state of their own: the session goes in
/// with every call and the rotated session comes back in the response.
/// Object safe, so the orchestrator works with `Arc<dyn AdtTransport>`.
#[async_trait]
pub trait AdtTransport: Send + Sync + std::fmt::Debug {
    /// Open a new logical session (credential check plus CSRF token fetch).
    async fn connect(&self) -> ClientResult<SessionContext>;

    /// Issue one call under `session`.
    async fn execute(
        &self,
        session: &SessionContext,
        request: RemoteRequest,
    ) -> ClientResult<RemoteResponse>;
}
