//! One orchestrator shared by independent concurrent workflows.

use std::sync::Arc;

use futures::future::join_all;

use adt_core::{ObjectDescriptor, ObjectKind, ObjectPayload, WorkflowOrchestrator, WorkflowRequest, WorkflowState};

use crate::common::routing_transport;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_workflows_share_one_orchestrator() {
    let transport = routing_transport();
    let orchestrator = Arc::new(WorkflowOrchestrator::with_adt_defaults(transport.clone()));

    let runs = (0..8).map(|i| {
        let orchestrator = orchestrator.clone();
        tokio::spawn(async move {
            let request = WorkflowRequest::builder()
                .descriptor(ObjectDescriptor::new(ObjectKind::Program, format!("zdemo_{i}")).with_package("$tmp"))
                .payload(ObjectPayload::default().with_source(format!("REPORT zdemo_{i}.")))
                .build();
            orchestrator.run_create(request).await
        })
    });

    let results = join_all(runs).await;

    for joined in results {
        let result = joined.unwrap().unwrap();
        assert!(result.success, "{}: {:?}", result.descriptor, result.state);
        assert_eq!(result.state, WorkflowState::Completed);
        assert_eq!(result.steps.len(), 7);
    }
    assert_eq!(transport.unlock_count(), 8);
    assert_eq!(transport.call_count(), 8 * 7);
}
