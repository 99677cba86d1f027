//! Lifecycle tools.
//!
//! Async functions that take the shared orchestrator, the workflow policy and
//! a param struct. The mutating ones implement the two-phase preview→confirm
//! pattern; a preview never touches the remote system.

use adt_orchestration::{
    ObjectKindCapabilities, OperationRequest, OrchestrationError, WorkflowOrchestrator,
};
use adt_shared::config::WorkflowPolicyConfig;
use adt_shared::{
    AdtError, LockHandle, ObjectDescriptor, SessionContext, StepName, WorkflowKind, WorkflowRequest,
};

use super::helpers::{build_preview, error_json, to_pretty_json, ConfirmationPhase};
use super::params::{
    CreateObjectParams, DeleteObjectParams, ObjectOperationParams, ObjectRefParams, UpdateObjectParams,
};

/// Optional steps after the policy defaults have been applied.
#[derive(Debug, Clone, Copy)]
struct StepFlags {
    validate: bool,
    check: bool,
    activate: bool,
}

pub fn list_object_kinds(orchestrator: &WorkflowOrchestrator) -> String {
    let registry = orchestrator.registry();
    let kinds: Vec<serde_json::Value> = registry
        .kinds()
        .into_iter()
        .filter_map(|kind| registry.resolve(kind).ok())
        .map(|capabilities| {
            serde_json::json!({
                "kind": capabilities.kind.tag(),
                "adt_type": capabilities.kind.adt_type(),
                "requires_parent": capabilities.kind.requires_parent(),
                "steps": capabilities.supported_steps(),
            })
        })
        .collect();

    to_pretty_json(&serde_json::json!({ "count": kinds.len(), "kinds": kinds }))
}

pub async fn create_object(
    orchestrator: &WorkflowOrchestrator,
    policy: &WorkflowPolicyConfig,
    params: CreateObjectParams,
) -> String {
    let (descriptor, capabilities) = match resolve(orchestrator, &params.object) {
        Ok(resolved) => resolved,
        Err(error) => return error,
    };
    let flags = StepFlags {
        validate: params.validate.unwrap_or(policy.validate_before_create),
        check: params.check.unwrap_or(policy.check_before_unlock),
        activate: params.activate.unwrap_or(policy.default_activate),
    };

    match ConfirmationPhase::from_flag(params.confirm) {
        ConfirmationPhase::Preview => to_pretty_json(&build_preview(
            "create_object",
            &format!("Create {descriptor}"),
            serde_json::json!({
                "object": descriptor,
                "planned_steps": planned_steps(&capabilities, WorkflowKind::Create, flags),
                "has_source": params.source.is_some(),
            }),
        )),
        ConfirmationPhase::Execute => {
            let request = WorkflowRequest::builder()
                .descriptor(descriptor)
                .payload(params.payload())
                .validate(flags.validate)
                .check(flags.check)
                .activate(flags.activate)
                .build();
            match orchestrator.run_create(request).await {
                Ok(result) => to_pretty_json(&result.detach_session()),
                Err(e) => orchestration_error_json(&e),
            }
        }
    }
}

pub async fn update_object(
    orchestrator: &WorkflowOrchestrator,
    policy: &WorkflowPolicyConfig,
    params: UpdateObjectParams,
) -> String {
    let (descriptor, capabilities) = match resolve(orchestrator, &params.object) {
        Ok(resolved) => resolved,
        Err(error) => return error,
    };
    let flags = StepFlags {
        validate: false,
        check: params.check.unwrap_or(policy.check_before_unlock),
        activate: params.activate.unwrap_or(policy.default_activate),
    };

    match ConfirmationPhase::from_flag(params.confirm) {
        ConfirmationPhase::Preview => to_pretty_json(&build_preview(
            "update_object",
            &format!("Update {descriptor}"),
            serde_json::json!({
                "object": descriptor,
                "planned_steps": planned_steps(&capabilities, WorkflowKind::Update, flags),
                "has_source": params.source.is_some(),
            }),
        )),
        ConfirmationPhase::Execute => {
            let request = WorkflowRequest::builder()
                .descriptor(descriptor)
                .payload(params.payload())
                .check(flags.check)
                .activate(flags.activate)
                .build();
            match orchestrator.run_update(request).await {
                Ok(result) => to_pretty_json(&result.detach_session()),
                Err(e) => orchestration_error_json(&e),
            }
        }
    }
}

pub async fn delete_object(orchestrator: &WorkflowOrchestrator, params: DeleteObjectParams) -> String {
    let (descriptor, capabilities) = match resolve(orchestrator, &params.object) {
        Ok(resolved) => resolved,
        Err(error) => return error,
    };

    match ConfirmationPhase::from_flag(params.confirm) {
        ConfirmationPhase::Preview => {
            let flags = StepFlags {
                validate: false,
                check: false,
                activate: false,
            };
            to_pretty_json(&build_preview(
                "delete_object",
                &format!("Delete {descriptor}"),
                serde_json::json!({
                    "object": descriptor,
                    "planned_steps": planned_steps(&capabilities, WorkflowKind::Delete, flags),
                    "warning": "Deletion cannot be undone.",
                }),
            ))
        }
        ConfirmationPhase::Execute => {
            let request = WorkflowRequest::builder().descriptor(descriptor).build();
            match orchestrator.run_delete(request).await {
                Ok(result) => to_pretty_json(&result.detach_session()),
                Err(e) => orchestration_error_json(&e),
            }
        }
    }
}

/// One remote call. Session and lock handle travel explicitly in the params
/// and the result, so a caller can chain `lock → update → unlock` by hand.
pub async fn object_operation(orchestrator: &WorkflowOrchestrator, params: ObjectOperationParams) -> String {
    let step: StepName = match params.step.parse() {
        Ok(step) => step,
        Err(e) => return shared_error_json(&e),
    };
    let descriptor = match params.object.to_descriptor() {
        Ok(descriptor) => descriptor,
        Err(e) => return shared_error_json(&e),
    };
    let session = match params.session.clone().map(serde_json::from_value::<SessionContext>) {
        Some(Err(e)) => return error_json("invalid_session", &e.to_string()),
        Some(Ok(session)) => Some(session),
        None => None,
    };
    let lock_handle = match params.lock_handle.clone().map(serde_json::from_value::<LockHandle>) {
        Some(Err(e)) => return error_json("invalid_lock_handle", &e.to_string()),
        Some(Ok(handle)) => Some(handle),
        None => None,
    };

    if step.is_mutating() && ConfirmationPhase::from_flag(params.confirm) == ConfirmationPhase::Preview {
        return to_pretty_json(&build_preview(
            "object_operation",
            &format!("{step} {descriptor}"),
            serde_json::json!({
                "object": descriptor,
                "step": step,
                "has_session": session.is_some(),
                "has_lock_handle": lock_handle.is_some(),
            }),
        ));
    }

    let request = OperationRequest::builder()
        .step(step)
        .descriptor(descriptor)
        .payload(params.payload())
        .maybe_session(session)
        .maybe_lock_handle(lock_handle)
        .build();
    match orchestrator.execute_operation(request).await {
        Ok(result) => to_pretty_json(&result),
        Err(e) => orchestration_error_json(&e),
    }
}

fn resolve(
    orchestrator: &WorkflowOrchestrator,
    object: &ObjectRefParams,
) -> Result<(ObjectDescriptor, std::sync::Arc<ObjectKindCapabilities>), String> {
    let descriptor = object.to_descriptor().map_err(|e| shared_error_json(&e))?;
    descriptor.validate().map_err(|e| shared_error_json(&e))?;
    let capabilities = orchestrator
        .registry()
        .resolve(descriptor.kind())
        .map_err(|e| orchestration_error_json(&e))?;
    Ok((descriptor, capabilities))
}

fn planned_steps(capabilities: &ObjectKindCapabilities, workflow: WorkflowKind, flags: StepFlags) -> Vec<StepName> {
    let wanted = |step: StepName, enabled: bool| (enabled && capabilities.supports(step)).then_some(step);
    let sequence = match workflow {
        WorkflowKind::Create => vec![
            wanted(StepName::Validate, flags.validate),
            Some(StepName::Create),
            Some(StepName::Lock),
            Some(StepName::Update),
            wanted(StepName::Check, flags.check),
            Some(StepName::Unlock),
            wanted(StepName::Activate, flags.activate),
        ],
        WorkflowKind::Update => vec![
            Some(StepName::Lock),
            Some(StepName::Update),
            wanted(StepName::Check, flags.check),
            Some(StepName::Unlock),
            wanted(StepName::Activate, flags.activate),
        ],
        WorkflowKind::Delete => vec![Some(StepName::Lock), Some(StepName::Delete)],
    };
    sequence.into_iter().flatten().collect()
}

fn shared_error_json(err: &AdtError) -> String {
    let code = match err {
        AdtError::UnknownObjectKind(_) => "unknown_object_kind",
        AdtError::InvalidInput(_) => "invalid_input",
        _ => "internal_error",
    };
    error_json(code, &err.to_string())
}

fn orchestration_error_json(err: &OrchestrationError) -> String {
    match err {
        OrchestrationError::UnknownObjectKind(_) => error_json("unknown_object_kind", &err.to_string()),
        OrchestrationError::UnsupportedStep { .. } => error_json("unsupported_step", &err.to_string()),
        OrchestrationError::Shared(shared) => shared_error_json(shared),
    }
}
