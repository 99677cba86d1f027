//! # Step Executors
//!
//! One [`StepExecutor`] performs one lifecycle verb for one object kind: it
//! renders a single remote call, issues it under the session it was handed,
//! and turns the response into a [`StepOutcome`] plus the rotated session.
//!
//! Executors never return `Err`. Transport failures, non-2xx statuses and
//! findings inside successful documents all become failed outcomes with a
//! classified [`ErrorKind`].

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde_json::json;
use tracing::{debug, warn};

use adt_client::{AdtTransport, RemoteRequest, RemoteResponse};
use adt_shared::{
    ErrorClassifier, ErrorKind, ErrorMessage, LockHandle, ObjectDescriptor, ObjectKind,
    ObjectPayload, SessionContext, Severity, StepName, StepOutcome,
};

use crate::endpoints;
use crate::response::{self, Finding};

const XML_CONTENT_TYPE: &str = "application/*";
const SOURCE_CONTENT_TYPE: &str = "text/plain; charset=utf-8";
const LOCK_ACCEPT: &str =
    "application/vnd.sap.as+xml;charset=UTF-8;dataname=com.sap.adt.lock.result";
const CHECK_RUN_PATH: &str = "/sap/bc/adt/checkruns";
const ACTIVATION_PATH: &str = "/sap/bc/adt/activation";

/// Everything one step needs. Owned so it can outlive the workflow future
/// (see the lock lease drop path).
#[derive(Debug, Clone)]
pub struct StepContext {
    pub descriptor: ObjectDescriptor,
    pub payload: Arc<ObjectPayload>,
    pub session: SessionContext,
    pub lock_handle: Option<LockHandle>,
}

impl StepContext {
    pub fn new(descriptor: ObjectDescriptor, payload: Arc<ObjectPayload>, session: SessionContext) -> Self {
        Self {
            descriptor,
            payload,
            session,
            lock_handle: None,
        }
    }

    pub fn with_lock_handle(mut self, handle: Option<LockHandle>) -> Self {
        self.lock_handle = handle;
        self
    }

    pub fn with_session(mut self, session: SessionContext) -> Self {
        self.session = session;
        self
    }
}

/// Result of one step.
#[derive(Debug, Clone)]
pub struct StepExecution {
    pub outcome: StepOutcome,
    /// Session to feed into the next step
    pub session: SessionContext,
    /// Set by a successful Lock
    pub lock_handle: Option<LockHandle>,
}

impl StepExecution {
    fn failed(step: StepName, message: ErrorMessage, session: SessionContext) -> Self {
        Self {
            outcome: StepOutcome::failed(step, message),
            session,
            lock_handle: None,
        }
    }
}

#[async_trait]
pub trait StepExecutor: Send + Sync + std::fmt::Debug {
    fn step(&self) -> StepName;

    async fn execute(&self, ctx: &StepContext) -> StepExecution;
}

/// Run `executor` with a time budget.
///
/// On expiry the step fails with [`ErrorKind::Unknown`] and the inbound
/// session is carried forward unchanged. Wall-clock duration is recorded on
/// the outcome either way.
pub async fn execute_with_timeout(
    executor: &dyn StepExecutor,
    ctx: &StepContext,
    budget: Duration,
) -> StepExecution {
    let step = executor.step();
    let started = Instant::now();
    debug!(step = %step, object = %ctx.descriptor, "Step starting");

    let mut execution = match tokio::time::timeout(budget, executor.execute(ctx)).await {
        Ok(execution) => execution,
        Err(_) => StepExecution::failed(
            step,
            ErrorMessage::error(
                ErrorKind::Unknown,
                format!("{step} timed out after {}ms", budget.as_millis()),
            ),
            ctx.session.clone(),
        ),
    };
    execution.outcome.duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

    if execution.outcome.success {
        debug!(
            step = %step,
            object = %ctx.descriptor,
            duration_ms = execution.outcome.duration_ms,
            "Step succeeded"
        );
    } else {
        warn!(
            step = %step,
            object = %ctx.descriptor,
            kind = ?execution.outcome.error_kind(),
            duration_ms = execution.outcome.duration_ms,
            "Step failed"
        );
    }
    execution
}

/// The ADT REST implementation of every verb, parameterized by verb and kind.
#[derive(Debug, Clone)]
pub struct AdtStepExecutor {
    step: StepName,
    kind: ObjectKind,
    transport: Arc<dyn AdtTransport>,
    classifier: ErrorClassifier,
}

impl AdtStepExecutor {
    pub fn new(step: StepName, kind: ObjectKind, transport: Arc<dyn AdtTransport>) -> Self {
        Self {
            step,
            kind,
            transport,
            classifier: ErrorClassifier::new(),
        }
    }

    pub fn kind(&self) -> ObjectKind {
        self.kind
    }

    /// Lock handle check for verbs that need one. Never touches the network.
    fn require_lock<'a>(&self, ctx: &'a StepContext) -> Result<&'a LockHandle, ErrorMessage> {
        let handle = ctx.lock_handle.as_ref().ok_or_else(|| {
            ErrorMessage::error(
                ErrorKind::InvalidLock,
                format!("{} of {} requires a lock handle", self.step, ctx.descriptor),
            )
        })?;
        if !handle.is_bound_to(&ctx.session) {
            return Err(ErrorMessage::error(
                ErrorKind::InvalidLock,
                format!(
                    "lock handle for {} belongs to a different session",
                    ctx.descriptor
                ),
            ));
        }
        let target = endpoints::object_uri(&ctx.descriptor);
        if handle.object_uri() != target {
            return Err(ErrorMessage::error(
                ErrorKind::InvalidLock,
                format!(
                    "lock handle was issued for {}, not {}",
                    handle.object_uri(),
                    target
                ),
            ));
        }
        Ok(handle)
    }

    fn render(&self, ctx: &StepContext) -> Result<RemoteRequest, ErrorMessage> {
        let descriptor = &ctx.descriptor;
        let endpoint = endpoints::endpoint(self.kind);
        let object_uri = endpoints::object_uri(descriptor);
        let lock_handle = if self.step.requires_lock() {
            self.require_lock(ctx)?.value()
        } else {
            ""
        };

        let request = match self.step {
            StepName::Validate => {
                let mut request = RemoteRequest::post(endpoint.validation)
                    .with_query("objtype", self.kind.adt_type())
                    .with_query("objname", descriptor.name());
                if let Some(package) = descriptor.package_name() {
                    request = request.with_query("packagename", package);
                }
                if let Some(description) = &ctx.payload.description {
                    request = request.with_query("description", description.as_str());
                }
                if let Some(group) = descriptor.parent_name() {
                    request = request.with_query("fugrname", group);
                }
                request.with_accept("application/xml")
            }
            StepName::Create => {
                let request = RemoteRequest::post(endpoints::collection_uri(descriptor)).with_body(
                    XML_CONTENT_TYPE,
                    endpoints::creation_document(descriptor, &ctx.payload),
                );
                with_transport_request(request, descriptor)
            }
            StepName::Lock => RemoteRequest::post(object_uri)
                .with_query("_action", "LOCK")
                .with_query("accessMode", "MODIFY")
                .with_accept(LOCK_ACCEPT)
                .stateful(),
            StepName::Update => {
                let request = match (&ctx.payload.source, endpoint.has_source) {
                    (Some(source), true) => RemoteRequest::put(endpoints::source_uri(descriptor))
                        .with_body(SOURCE_CONTENT_TYPE, source.as_str()),
                    _ => RemoteRequest::put(object_uri).with_body(
                        XML_CONTENT_TYPE,
                        endpoints::creation_document(descriptor, &ctx.payload),
                    ),
                };
                with_transport_request(request.with_query("lockHandle", lock_handle), descriptor)
                    .stateful()
            }
            StepName::Check => RemoteRequest::post(CHECK_RUN_PATH)
                .with_query("reporters", "abapCheckRun")
                .with_body(XML_CONTENT_TYPE, endpoints::check_run_document(descriptor))
                .with_accept("application/vnd.sap.adt.checkmessages+xml"),
            StepName::Unlock => RemoteRequest::post(object_uri)
                .with_query("_action", "UNLOCK")
                .with_query("lockHandle", lock_handle)
                .stateful(),
            StepName::Activate => RemoteRequest::post(ACTIVATION_PATH)
                .with_query("method", "activate")
                .with_query("preauditRequested", "true")
                .with_body(XML_CONTENT_TYPE, endpoints::activation_document(descriptor)),
            StepName::Delete => {
                with_transport_request(
                    RemoteRequest::delete(object_uri).with_query("lockHandle", lock_handle),
                    descriptor,
                )
                .stateful()
            }
        };
        Ok(request)
    }

    /// Outcome of a 2xx response.
    fn interpret(&self, ctx: &StepContext, response: RemoteResponse) -> StepExecution {
        let status = response.status;
        let session = response.session;

        match self.step {
            StepName::Validate => {
                let findings = response::validation_findings(&response.body);
                let outcome = self.outcome_from_findings(&findings, ErrorKind::ValidationFailed);
                StepExecution {
                    outcome: outcome.with_raw(json!({ "status": status })),
                    session,
                    lock_handle: None,
                }
            }
            StepName::Lock => match response::lock_handle(&response.body) {
                Some(value) => {
                    let handle = LockHandle::new(value, &session, endpoints::object_uri(&ctx.descriptor));
                    StepExecution {
                        outcome: StepOutcome::succeeded(StepName::Lock).with_raw(json!({
                            "lock_handle": handle.value(),
                            "object_uri": handle.object_uri(),
                        })),
                        session,
                        lock_handle: Some(handle),
                    }
                }
                None => StepExecution::failed(
                    StepName::Lock,
                    ErrorMessage::error(ErrorKind::Unknown, "lock response carried no lock handle"),
                    session,
                ),
            },
            StepName::Check => {
                let findings = response::check_findings(&response.body);
                let errors = findings.iter().filter(|f| f.is_error()).count();
                let outcome = self.outcome_from_findings(&findings, ErrorKind::ValidationFailed);
                StepExecution {
                    outcome: outcome.with_raw(json!({
                        "errors": errors,
                        "warnings": findings.len() - errors,
                    })),
                    session,
                    lock_handle: None,
                }
            }
            StepName::Activate => {
                let report = response::activation_report(&response.body);
                let mut outcome = self.outcome_from_findings(&report.findings, ErrorKind::ValidationFailed);
                if report.activation_executed == Some(false) && !report.has_errors() {
                    outcome.success = false;
                    outcome.messages.push(ErrorMessage::error(
                        ErrorKind::ValidationFailed,
                        format!("activation of {} was not executed", ctx.descriptor),
                    ));
                }
                StepExecution {
                    outcome: outcome.with_raw(json!({
                        "status": status,
                        "activation_executed": report.activation_executed,
                    })),
                    session,
                    lock_handle: None,
                }
            }
            StepName::Create | StepName::Update | StepName::Unlock | StepName::Delete => StepExecution {
                outcome: StepOutcome::succeeded(self.step).with_raw(json!({ "status": status })),
                session,
                lock_handle: None,
            },
        }
    }

    /// Errors fail the step; warnings ride along on a successful one.
    fn outcome_from_findings(&self, findings: &[Finding], default_kind: ErrorKind) -> StepOutcome {
        let messages: Vec<ErrorMessage> = findings
            .iter()
            .map(|finding| {
                let kind = match finding.severity {
                    Severity::Error => self.classifier.classify_message(&finding.text),
                    Severity::Warning => default_kind,
                };
                ErrorMessage {
                    kind,
                    text: finding.text.clone(),
                    severity: finding.severity,
                }
            })
            .collect();

        StepOutcome {
            step: self.step,
            success: !messages.iter().any(ErrorMessage::is_error),
            messages,
            raw: None,
            duration_ms: 0,
        }
    }
}

fn with_transport_request(request: RemoteRequest, descriptor: &ObjectDescriptor) -> RemoteRequest {
    match descriptor.transport_request() {
        Some(corr_nr) => request.with_query("corrNr", corr_nr),
        None => request,
    }
}

#[async_trait]
impl StepExecutor for AdtStepExecutor {
    fn step(&self) -> StepName {
        self.step
    }

    async fn execute(&self, ctx: &StepContext) -> StepExecution {
        let request = match self.render(ctx) {
            Ok(request) => request,
            Err(message) => return StepExecution::failed(self.step, message, ctx.session.clone()),
        };

        match self.transport.execute(&ctx.session, request).await {
            Ok(response) if response.is_success() => self.interpret(ctx, response),
            Ok(response) => {
                let classification = self.classifier.classify(response.status, response.body_text());
                StepExecution {
                    outcome: StepOutcome::failed(
                        self.step,
                        ErrorMessage::error(classification.kind, classification.message),
                    )
                    .with_raw(json!({ "status": response.status })),
                    session: response.session,
                    lock_handle: None,
                }
            }
            Err(err) => {
                let classification = err.classify(&self.classifier);
                StepExecution::failed(
                    self.step,
                    ErrorMessage::error(classification.kind, classification.message),
                    ctx.session.clone(),
                )
            }
        }
    }
}
