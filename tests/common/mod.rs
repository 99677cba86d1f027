//! Shared fixtures for workspace-level tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use adt_client::testing::ScriptedReply;
use adt_client::{AdtTransport, ClientResult, RemoteRequest, RemoteResponse};
use adt_core::SessionContext;

pub const VALIDATE_OK: &str =
    "<asx:abap><asx:values><DATA><CHECK_RESULT>X</CHECK_RESULT></DATA></asx:values></asx:abap>";
pub const VALIDATE_EXISTS: &str = "<asx:abap><asx:values><DATA><SEVERITY>ERROR</SEVERITY>\
    <SHORT_TEXT>Class ZCL_DEMO already exists</SHORT_TEXT></DATA></asx:values></asx:abap>";
pub const LOCK_OK: &str =
    "<asx:abap><asx:values><DATA><LOCK_HANDLE>LH-0001</LOCK_HANDLE></DATA></asx:values></asx:abap>";
pub const CHECK_CLEAN: &str = r#"<chkrun:checkRunReports xmlns:chkrun="http://www.sap.com/adt/checkrun"/>"#;
pub const ACTIVATED: &str = r#"<chkl:messages xmlns:chkl="http://www.sap.com/abapxml/checklist"><chkl:properties checkExecuted="true" activationExecuted="true"/></chkl:messages>"#;

/// Replies for a create workflow in which every step succeeds.
pub fn create_happy_path() -> Vec<ScriptedReply> {
    vec![
        ScriptedReply::ok(VALIDATE_OK),
        ScriptedReply::status(201, ""),
        ScriptedReply::ok(LOCK_OK),
        ScriptedReply::empty(),
        ScriptedReply::ok(CHECK_CLEAN),
        ScriptedReply::empty(),
        ScriptedReply::ok(ACTIVATED),
    ]
}

/// Answers by request shape instead of a FIFO script, so concurrent
/// workflows can share one transport.
#[derive(Debug, Default)]
pub struct RoutingTransport {
    calls: AtomicUsize,
    unlocks: AtomicUsize,
}

impl RoutingTransport {
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn unlock_count(&self) -> usize {
        self.unlocks.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AdtTransport for RoutingTransport {
    async fn connect(&self) -> ClientResult<SessionContext> {
        Ok(SessionContext::fresh().with_csrf_token("ROUTED"))
    }

    async fn execute(&self, session: &SessionContext, request: RemoteRequest) -> ClientResult<RemoteResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;

        let body = match request.query_value("_action") {
            Some("LOCK") => LOCK_OK,
            Some("UNLOCK") => {
                self.unlocks.fetch_add(1, Ordering::SeqCst);
                ""
            }
            _ if request.path.ends_with("/validation") || request.path.ends_with("/objectname") => VALIDATE_OK,
            _ if request.path.starts_with("/sap/bc/adt/checkruns") => CHECK_CLEAN,
            _ if request.path.starts_with("/sap/bc/adt/activation") => ACTIVATED,
            _ => "",
        };

        Ok(RemoteResponse {
            status: 200,
            body: body.to_string(),
            session: session.clone(),
        })
    }
}

pub fn routing_transport() -> Arc<RoutingTransport> {
    Arc::new(RoutingTransport::default())
}
