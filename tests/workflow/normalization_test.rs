//! Case normalization: names reach the wire uppercased for every kind.

use std::sync::Arc;

use adt_client::testing::{ScriptedReply, ScriptedTransport};
use adt_core::orchestration::OperationRequest;
use adt_core::{ObjectDescriptor, ObjectKind, SessionContext, StepName, WorkflowOrchestrator};

use crate::common::{LOCK_OK, VALIDATE_OK};

fn lowercase_descriptor(kind: ObjectKind) -> ObjectDescriptor {
    let descriptor = ObjectDescriptor::new(kind, "z_test").with_package("$tmp");
    if kind.requires_parent() {
        descriptor.with_parent("zfg_test")
    } else {
        descriptor
    }
}

#[tokio::test]
async fn test_every_kind_sends_uppercase_names() {
    for kind in ObjectKind::ALL {
        let transport = Arc::new(ScriptedTransport::with_replies([
            ScriptedReply::ok(VALIDATE_OK),
            ScriptedReply::ok(LOCK_OK),
        ]));
        let orchestrator = WorkflowOrchestrator::with_adt_defaults(transport.clone());
        let session = SessionContext::fresh();

        for step in [StepName::Validate, StepName::Lock] {
            let result = orchestrator
                .execute_operation(
                    OperationRequest::builder()
                        .step(step)
                        .descriptor(lowercase_descriptor(kind))
                        .session(session.clone())
                        .build(),
                )
                .await
                .unwrap();
            assert!(result.success, "{kind} {step}: {:?}", result.messages);
        }

        let calls = transport.calls();
        assert_eq!(calls[0].query_value("objname"), Some("Z_TEST"), "{kind}");
        assert_eq!(calls[0].query_value("packagename"), Some("$TMP"), "{kind}");
        assert!(calls[1].path.ends_with("/Z_TEST"), "{kind}: {}", calls[1].path);
        assert!(!calls[1].path.contains("z_test"), "{kind}: {}", calls[1].path);
        if kind.requires_parent() {
            assert!(calls[1].path.contains("/ZFG_TEST/"), "{kind}: {}", calls[1].path);
            assert_eq!(calls[0].query_value("fugrname"), Some("ZFG_TEST"), "{kind}");
        }
    }
}
