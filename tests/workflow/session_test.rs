//! Session continuity: each call is issued under the session returned by
//! the previous one.

use std::sync::Arc;

use adt_client::testing::{ScriptedReply, ScriptedTransport};
use adt_core::orchestration::OperationRequest;
use adt_core::{
    ErrorKind, ObjectDescriptor, ObjectKind, ObjectPayload, SessionContext, StepName, WorkflowOrchestrator,
    WorkflowRequest, WorkflowState,
};

use crate::common::{ACTIVATED, CHECK_CLEAN, LOCK_OK, VALIDATE_OK};

fn program(session: Option<SessionContext>) -> WorkflowRequest {
    WorkflowRequest::builder()
        .descriptor(ObjectDescriptor::new(ObjectKind::Program, "zdemo").with_package("$tmp"))
        .payload(ObjectPayload::default().with_source("REPORT zdemo."))
        .maybe_session(session)
        .build()
}

#[tokio::test]
async fn test_rotated_token_is_threaded_into_the_next_call() {
    let transport = Arc::new(ScriptedTransport::with_replies([
        ScriptedReply::ok(VALIDATE_OK),
        ScriptedReply::status(201, "").rotating_token("T1"),
        ScriptedReply::ok(LOCK_OK),
        ScriptedReply::empty().rotating_token("T2"),
        ScriptedReply::ok(CHECK_CLEAN),
        ScriptedReply::empty(),
        ScriptedReply::ok(ACTIVATED),
    ]));
    let orchestrator = WorkflowOrchestrator::with_adt_defaults(transport.clone());
    let inbound = SessionContext::fresh().with_csrf_token("T0");

    let result = orchestrator.run_create(program(Some(inbound.clone()))).await.unwrap();

    assert!(result.success);
    assert_eq!(transport.connect_count(), 0);

    let tokens: Vec<Option<String>> = transport
        .calls()
        .iter()
        .map(|call| call.session.csrf_token().map(str::to_string))
        .collect();
    assert_eq!(
        tokens,
        vec![
            Some("T0".to_string()),
            Some("T0".to_string()),
            Some("T1".to_string()),
            Some("T1".to_string()),
            Some("T2".to_string()),
            Some("T2".to_string()),
            Some("T2".to_string()),
        ]
    );
    let session = result.session.as_ref().unwrap();
    assert_eq!(session.csrf_token(), Some("T2"));
    assert_eq!(session.session_id(), inbound.session_id());
    assert!(result.detach_session().session.is_none());
}

#[tokio::test]
async fn test_missing_session_is_established_once() {
    let mut replies = vec![ScriptedReply::ok(VALIDATE_OK), ScriptedReply::status(201, "")];
    replies.extend([
        ScriptedReply::ok(LOCK_OK),
        ScriptedReply::empty(),
        ScriptedReply::ok(CHECK_CLEAN),
        ScriptedReply::empty(),
        ScriptedReply::ok(ACTIVATED),
    ]);
    let transport = Arc::new(ScriptedTransport::with_replies(replies).with_connect_token("FRESH"));
    let orchestrator = WorkflowOrchestrator::with_adt_defaults(transport.clone());

    let result = orchestrator.run_create(program(None)).await.unwrap();

    assert!(result.success);
    assert_eq!(transport.connect_count(), 1);
    assert!(transport
        .calls()
        .iter()
        .all(|call| call.session.csrf_token() == Some("FRESH")));
}

#[tokio::test]
async fn test_lock_handle_is_bound_to_its_session() {
    let transport = Arc::new(ScriptedTransport::with_replies([ScriptedReply::ok(LOCK_OK)]));
    let orchestrator = WorkflowOrchestrator::with_adt_defaults(transport.clone());
    let descriptor = ObjectDescriptor::new(ObjectKind::Program, "zdemo");

    let lock = orchestrator
        .execute_operation(
            OperationRequest::builder()
                .step(StepName::Lock)
                .descriptor(descriptor.clone())
                .session(SessionContext::fresh())
                .build(),
        )
        .await
        .unwrap();
    assert!(lock.success);

    // Same handle under a different session is rejected without a call
    let unlock = orchestrator
        .execute_operation(
            OperationRequest::builder()
                .step(StepName::Unlock)
                .descriptor(descriptor)
                .session(SessionContext::fresh())
                .maybe_lock_handle(lock.lock_handle)
                .build(),
        )
        .await
        .unwrap();

    assert!(!unlock.success);
    assert_eq!(unlock.error_kind, Some(ErrorKind::InvalidLock));
    assert_eq!(transport.call_count(), 1);
}

#[tokio::test]
async fn test_expired_csrf_token_surfaces_without_rehandshake() {
    let transport = Arc::new(ScriptedTransport::with_replies([ScriptedReply::status(
        403,
        "CSRF token validation failed",
    )]));
    let orchestrator = WorkflowOrchestrator::with_adt_defaults(transport.clone());
    let inbound = SessionContext::fresh().with_csrf_token("STALE");

    let result = orchestrator.run_create(program(Some(inbound))).await.unwrap();

    assert_eq!(transport.connect_count(), 0);
    assert_eq!(transport.call_count(), 1);
    assert_eq!(result.state, WorkflowState::Aborted);
    assert!(!result.success);
    assert_eq!(result.steps.len(), 1);
    assert_eq!(
        result.step(StepName::Validate).and_then(|o| o.error_kind()),
        Some(ErrorKind::AuthenticationFailed)
    );
}

#[tokio::test]
async fn test_expired_logon_on_lock_aborts_update() {
    let transport = Arc::new(ScriptedTransport::with_replies([ScriptedReply::status(401, "")]));
    let orchestrator = WorkflowOrchestrator::with_adt_defaults(transport.clone());
    let inbound = SessionContext::fresh().with_csrf_token("T0");

    let result = orchestrator.run_update(program(Some(inbound))).await.unwrap();

    assert_eq!(transport.connect_count(), 0);
    assert_eq!(transport.call_count(), 1);
    assert_eq!(result.state, WorkflowState::Aborted);
    assert_eq!(
        result.step(StepName::Lock).and_then(|o| o.error_kind()),
        Some(ErrorKind::AuthenticationFailed)
    );
    assert!(!result.attempted(StepName::Unlock));
}
