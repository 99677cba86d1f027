//! In-memory scripted transport for tests.
//!
//! Replies are consumed strictly in FIFO order, which matches the strictly
//! sequential call pattern of a workflow. Every call is recorded together with
//! the session it was issued under so tests can assert on session threading.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;

use adt_shared::SessionContext;

use crate::error::{ClientError, ClientResult};
use crate::request::{HttpMethod, RemoteRequest, RemoteResponse};
use crate::transport::AdtTransport;

/// One scripted reply.
#[derive(Debug, Clone)]
pub struct ScriptedReply {
    status: u16,
    body: String,
    set_cookies: Vec<String>,
    csrf_token: Option<String>,
    delay: Option<Duration>,
    transport_error: Option<String>,
}

impl ScriptedReply {
    pub fn status(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
            set_cookies: Vec::new(),
            csrf_token: None,
            delay: None,
            transport_error: None,
        }
    }

    pub fn ok(body: impl Into<String>) -> Self {
        Self::status(200, body)
    }

    pub fn empty() -> Self {
        Self::status(200, "")
    }

    /// The call fails before any response arrives.
    pub fn transport_error(message: impl Into<String>) -> Self {
        Self {
            transport_error: Some(message.into()),
            ..Self::empty()
        }
    }

    /// Response carries a rotated CSRF token.
    pub fn rotating_token(mut self, token: impl Into<String>) -> Self {
        self.csrf_token = Some(token.into());
        self
    }

    pub fn with_cookie(mut self, set_cookie: impl Into<String>) -> Self {
        self.set_cookies.push(set_cookie.into());
        self
    }

    /// Sleep before replying, to exercise timeouts.
    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

/// A call observed by the transport.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub method: HttpMethod,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<String>,
    pub stateful: bool,
    /// Session the call was issued under
    pub session: SessionContext,
}

impl RecordedCall {
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug)]
pub struct ScriptedTransport {
    connect_token: String,
    connect_failure: Option<(u16, String)>,
    replies: Mutex<VecDeque<ScriptedReply>>,
    calls: Mutex<Vec<RecordedCall>>,
    connects: AtomicUsize,
}

impl Default for ScriptedTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self {
            connect_token: "CSRF-CONNECT".to_string(),
            connect_failure: None,
            replies: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
            connects: AtomicUsize::new(0),
        }
    }

    /// Replies consumed in order.
    pub fn with_replies(replies: impl IntoIterator<Item = ScriptedReply>) -> Self {
        let transport = Self::new();
        lock(&transport.replies).extend(replies);
        transport
    }

    /// Token handed out by `connect`.
    pub fn with_connect_token(mut self, token: impl Into<String>) -> Self {
        self.connect_token = token.into();
        self
    }

    /// Make `connect` fail with the given status and body.
    pub fn with_connect_failure(mut self, status: u16, body: impl Into<String>) -> Self {
        self.connect_failure = Some((status, body.into()));
        self
    }

    pub fn push(&self, reply: ScriptedReply) {
        lock(&self.replies).push_back(reply);
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        lock(&self.calls).clone()
    }

    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }

    pub fn connect_count(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn remaining_replies(&self) -> usize {
        lock(&self.replies).len()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[async_trait]
impl AdtTransport for ScriptedTransport {
    async fn connect(&self) -> ClientResult<SessionContext> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        if let Some((status, body)) = &self.connect_failure {
            return Err(ClientError::handshake_failed(*status, body.clone()));
        }
        Ok(SessionContext::fresh().with_csrf_token(self.connect_token.clone()))
    }

    async fn execute(
        &self,
        session: &SessionContext,
        request: RemoteRequest,
    ) -> ClientResult<RemoteResponse> {
        lock(&self.calls).push(RecordedCall {
            method: request.method,
            path: request.path.clone(),
            query: request.query.clone(),
            body: request.body.clone(),
            stateful: request.stateful,
            session: session.clone(),
        });

        let reply = lock(&self.replies).pop_front().ok_or_else(|| {
            ClientError::Internal(format!(
                "no scripted reply left for {} {}",
                request.method, request.path
            ))
        })?;

        if let Some(delay) = reply.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(message) = reply.transport_error {
            return Err(ClientError::Internal(message));
        }

        Ok(RemoteResponse {
            status: reply.status,
            body: reply.body,
            session: session.with_rotation(&reply.set_cookies, reply.csrf_token.as_deref()),
        })
    }
}
