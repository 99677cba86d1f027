//! Create workflow: full run and the validation short-circuit.

use std::sync::Arc;

use adt_client::testing::{ScriptedReply, ScriptedTransport};
use adt_client::HttpMethod;
use adt_core::{
    ErrorKind, ObjectDescriptor, ObjectKind, ObjectPayload, StepName, WorkflowOrchestrator, WorkflowRequest,
    WorkflowState,
};

use crate::common::{create_happy_path, VALIDATE_EXISTS};

fn demo_class_request() -> WorkflowRequest {
    WorkflowRequest::builder()
        .descriptor(ObjectDescriptor::new(ObjectKind::Class, "ZCL_DEMO").with_package("$TMP"))
        .payload(
            ObjectPayload::default()
                .with_description("Demo class")
                .with_source("CLASS zcl_demo DEFINITION PUBLIC. ENDCLASS. CLASS zcl_demo IMPLEMENTATION. ENDCLASS."),
        )
        .build()
}

#[tokio::test]
async fn test_create_class_end_to_end() {
    let transport = Arc::new(ScriptedTransport::with_replies(create_happy_path()));
    let orchestrator = WorkflowOrchestrator::with_adt_defaults(transport.clone());

    let result = orchestrator.run_create(demo_class_request()).await.unwrap();

    assert!(result.success);
    assert_eq!(result.state, WorkflowState::Completed);
    assert_eq!(
        result.attempted_steps(),
        vec![
            StepName::Validate,
            StepName::Create,
            StepName::Lock,
            StepName::Update,
            StepName::Check,
            StepName::Unlock,
            StepName::Activate,
        ]
    );
    assert!(result.steps.iter().all(|outcome| outcome.success));
    assert!(!result.has_cleanup_failure());
    assert_eq!(result.lock_handle.as_ref().map(|h| h.value()), Some("LH-0001"));

    let calls = transport.calls();
    assert_eq!(calls.len(), 7);
    assert_eq!(calls[0].path, "/sap/bc/adt/oo/validation/objectname");
    assert_eq!(calls[1].method, HttpMethod::Post);
    assert_eq!(calls[1].path, "/sap/bc/adt/oo/classes");
    assert!(calls[1].body.as_deref().unwrap().contains(r#"adtcore:name="ZCL_DEMO""#));
    assert_eq!(calls[3].method, HttpMethod::Put);
    assert_eq!(calls[3].path, "/sap/bc/adt/oo/classes/ZCL_DEMO/source/main");
    assert_eq!(calls[3].query_value("lockHandle"), Some("LH-0001"));
    assert_eq!(calls[5].query_value("_action"), Some("UNLOCK"));
    assert_eq!(transport.remaining_replies(), 0);
}

#[tokio::test]
async fn test_existing_object_skips_the_workflow() {
    let transport = Arc::new(ScriptedTransport::with_replies([ScriptedReply::ok(VALIDATE_EXISTS)]));
    let orchestrator = WorkflowOrchestrator::with_adt_defaults(transport.clone());

    let result = orchestrator.run_create(demo_class_request()).await.unwrap();

    assert!(result.success);
    assert_eq!(result.state, WorkflowState::Skipped);
    assert_eq!(result.attempted_steps(), vec![StepName::Validate]);
    assert_eq!(result.steps[0].error_kind(), Some(ErrorKind::Conflict));
    assert!(!result.attempted(StepName::Create));
    assert!(!result.attempted(StepName::Lock));
    assert_eq!(transport.call_count(), 1);
}

#[tokio::test]
async fn test_unknown_kind_in_registry_is_an_error() {
    let transport = Arc::new(ScriptedTransport::new());
    let orchestrator = WorkflowOrchestrator::new(transport.clone(), adt_core::ObjectKindRegistry::new());

    let err = orchestrator.run_create(demo_class_request()).await.unwrap_err();

    assert!(matches!(
        err,
        adt_core::orchestration::OrchestrationError::UnknownObjectKind(_)
    ));
    assert_eq!(transport.connect_count(), 0);
}
