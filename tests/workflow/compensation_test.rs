//! Lock liveness: once Lock succeeds, Unlock is attempted exactly once on
//! every path out of the workflow.

use std::sync::Arc;
use std::time::Duration;

use adt_client::testing::{ScriptedReply, ScriptedTransport};
use adt_core::shared::config::TimeoutConfig;
use adt_core::{
    ErrorKind, ObjectDescriptor, ObjectKind, ObjectPayload, StepName, WorkflowOrchestrator, WorkflowRequest,
    WorkflowState,
};

use crate::common::{LOCK_OK, VALIDATE_OK};

fn request() -> WorkflowRequest {
    WorkflowRequest::builder()
        .descriptor(ObjectDescriptor::new(ObjectKind::Class, "ZCL_DEMO").with_package("$TMP"))
        .payload(ObjectPayload::default().with_source("CLASS zcl_demo DEFINITION PUBLIC. ENDCLASS."))
        .build()
}

fn unlock_calls(transport: &ScriptedTransport) -> usize {
    transport
        .calls()
        .iter()
        .filter(|call| call.query_value("_action") == Some("UNLOCK"))
        .count()
}

fn through_lock() -> Vec<ScriptedReply> {
    vec![
        ScriptedReply::ok(VALIDATE_OK),
        ScriptedReply::status(201, ""),
        ScriptedReply::ok(LOCK_OK),
    ]
}

#[tokio::test]
async fn test_update_and_unlock_failure_is_cleanup_failure() {
    let mut replies = through_lock();
    replies.push(ScriptedReply::status(500, "Internal server error"));
    replies.push(ScriptedReply::status(500, "Internal server error"));
    let transport = Arc::new(ScriptedTransport::with_replies(replies));
    let orchestrator = WorkflowOrchestrator::with_adt_defaults(transport.clone());

    let result = orchestrator.run_create(request()).await.unwrap();

    assert!(!result.success);
    assert_eq!(result.state, WorkflowState::CompletedWithCleanupFailure);
    assert_eq!(
        result.attempted_steps(),
        vec![
            StepName::Validate,
            StepName::Create,
            StepName::Lock,
            StepName::Update,
            StepName::Unlock,
        ]
    );
    assert!(!result.attempted(StepName::Check));
    assert!(!result.attempted(StepName::Activate));
    assert!(result.has_cleanup_failure());
    assert_eq!(
        result
            .step(StepName::Unlock)
            .unwrap()
            .messages
            .iter()
            .filter(|m| m.kind == ErrorKind::CleanupFailure)
            .count(),
        1
    );
    assert_eq!(unlock_calls(&transport), 1);
}

#[tokio::test]
async fn test_update_failure_releases_lock_once() {
    let mut replies = through_lock();
    replies.push(ScriptedReply::status(400, "Statement is not accessible"));
    replies.push(ScriptedReply::empty());
    let transport = Arc::new(ScriptedTransport::with_replies(replies));
    let orchestrator = WorkflowOrchestrator::with_adt_defaults(transport.clone());

    let result = orchestrator.run_create(request()).await.unwrap();

    assert_eq!(result.state, WorkflowState::Failed);
    assert!(result.step(StepName::Unlock).unwrap().success);
    assert!(!result.has_cleanup_failure());
    assert_eq!(unlock_calls(&transport), 1);
}

#[tokio::test]
async fn test_check_transport_failure_still_unlocks() {
    let mut replies = through_lock();
    replies.push(ScriptedReply::empty());
    replies.push(ScriptedReply::transport_error("connection reset by peer"));
    replies.push(ScriptedReply::empty());
    replies.push(ScriptedReply::ok(crate::common::ACTIVATED));
    let transport = Arc::new(ScriptedTransport::with_replies(replies));
    let orchestrator = WorkflowOrchestrator::with_adt_defaults(transport.clone());

    let result = orchestrator.run_create(request()).await.unwrap();

    let check = result.step(StepName::Check).unwrap();
    assert!(!check.success);
    assert_eq!(check.error_kind(), Some(ErrorKind::Unknown));
    assert!(result.step(StepName::Unlock).unwrap().success);
    assert_eq!(unlock_calls(&transport), 1);
}

#[tokio::test]
async fn test_update_timeout_releases_lock_once() {
    let mut replies = through_lock();
    replies.push(ScriptedReply::empty().delayed(Duration::from_secs(2)));
    replies.push(ScriptedReply::empty());
    let transport = Arc::new(ScriptedTransport::with_replies(replies));
    let timeouts = TimeoutConfig {
        update: 25,
        ..TimeoutConfig::default()
    };
    let orchestrator = WorkflowOrchestrator::with_adt_defaults(transport.clone()).with_timeouts(timeouts);

    let result = orchestrator.run_create(request()).await.unwrap();

    assert!(!result.success);
    assert_eq!(result.state, WorkflowState::Failed);
    let update = result.step(StepName::Update).unwrap();
    assert_eq!(update.error_kind(), Some(ErrorKind::Unknown));
    assert!(update.messages[0].text.contains("timed out after 25ms"));
    assert!(!result.attempted(StepName::Activate));
    assert_eq!(unlock_calls(&transport), 1);
}
