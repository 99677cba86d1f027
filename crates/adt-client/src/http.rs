//! # HTTP Transport
//!
//! `reqwest`-backed [`AdtTransport`]. Cookies are not kept in a client-side
//! jar; they live in the [`SessionContext`] and are replayed explicitly on
//! each call, so one transport can serve any number of concurrent sessions.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, ACCEPT, CONTENT_TYPE, COOKIE, SET_COOKIE};
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, warn};

use adt_shared::config::{ConnectionConfig, TimeoutConfig};
use adt_shared::SessionContext;

use crate::error::{ClientError, ClientResult};
use crate::request::{RemoteRequest, RemoteResponse};
use crate::transport::AdtTransport;

const CSRF_HEADER: &str = "x-csrf-token";
const SESSION_TYPE_HEADER: &str = "X-sap-adt-sessiontype";
const DISCOVERY_PATH: &str = "/sap/bc/adt/core/discovery";

#[derive(Debug)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
    sap_client: Option<String>,
    language: Option<String>,
    username: Option<String>,
    password: Option<SecretString>,
    connect_timeout: Duration,
}

impl HttpTransport {
    /// Build from configuration. `connection.base_url` is required.
    pub fn from_config(connection: &ConnectionConfig, timeouts: &TimeoutConfig) -> ClientResult<Self> {
        let base_url = connection
            .base_url
            .as_deref()
            .ok_or_else(|| ClientError::config_error("connection.base_url is not set"))?
            .trim_end_matches('/')
            .to_string();

        let client = reqwest::Client::builder()
            .danger_accept_invalid_certs(connection.insecure_tls)
            .connect_timeout(timeouts.connect_timeout())
            .build()?;

        Ok(Self {
            client,
            base_url,
            sap_client: connection.client.clone(),
            language: connection.language.clone(),
            username: connection.username.clone(),
            password: connection
                .password
                .as_ref()
                .map(|p| SecretString::from(p.expose_secret().to_string())),
            connect_timeout: timeouts.connect_timeout(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request_builder(&self, session: &SessionContext, request: &RemoteRequest) -> ClientResult<reqwest::RequestBuilder> {
        if !request.path.starts_with('/') {
            return Err(ClientError::InvalidRequest(format!(
                "path must start with '/': {}",
                request.path
            )));
        }

        let url = format!("{}{}", self.base_url, request.path);
        let mut builder = self.client.request(request.method.into(), url);

        let mut query: Vec<(&str, &str)> = request
            .query
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        if let Some(client) = &self.sap_client {
            query.push(("sap-client", client.as_str()));
        }
        if let Some(language) = &self.language {
            query.push(("sap-language", language.as_str()));
        }
        if !query.is_empty() {
            builder = builder.query(&query);
        }

        if let Some(username) = &self.username {
            builder = builder.basic_auth(
                username,
                self.password.as_ref().map(|p| p.expose_secret().to_string()),
            );
        }
        if let Some(cookies) = session.cookies() {
            builder = builder.header(COOKIE, cookies);
        }
        if let Some(token) = session.csrf_token() {
            builder = builder.header(CSRF_HEADER, token);
        }
        if request.stateful {
            builder = builder.header(SESSION_TYPE_HEADER, "stateful");
        }
        if let Some(accept) = &request.accept {
            builder = builder.header(ACCEPT, accept);
        }
        if let Some(body) = &request.body {
            if let Some(content_type) = &request.content_type {
                builder = builder.header(CONTENT_TYPE, content_type);
            }
            builder = builder.body(body.clone());
        }
        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }

        Ok(builder)
    }
}

/// Raw `Set-Cookie` values and the CSRF token header, if present.
fn session_headers(headers: &HeaderMap) -> (Vec<String>, Option<String>) {
    let set_cookies = headers
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .map(str::to_string)
        .collect();
    let token = headers
        .get(CSRF_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    (set_cookies, token)
}

#[async_trait]
impl AdtTransport for HttpTransport {
    async fn connect(&self) -> ClientResult<SessionContext> {
        let request = RemoteRequest::get(DISCOVERY_PATH)
            .with_accept("application/atomsvc+xml")
            .with_timeout(self.connect_timeout);
        let fresh = SessionContext::fresh();

        let response = self
            .request_builder(&fresh, &request)?
            .header(CSRF_HEADER, "Fetch")
            .send()
            .await?;

        let status = response.status().as_u16();
        let (set_cookies, token) = session_headers(response.headers());
        let body = response.text().await.unwrap_or_default();

        if !(200..300).contains(&status) {
            warn!(status, base_url = %self.base_url, "Session handshake rejected");
            return Err(ClientError::handshake_failed(status, body));
        }

        let session = fresh.with_rotation(&set_cookies, token.as_deref());
        if !session.is_established() {
            return Err(ClientError::handshake_failed(
                status,
                "remote system returned no CSRF token",
            ));
        }

        debug!(
            session_id = session.session_id().unwrap_or_default(),
            cookies = session.cookie_store().len(),
            "Session established"
        );
        Ok(session)
    }

    async fn execute(
        &self,
        session: &SessionContext,
        request: RemoteRequest,
    ) -> ClientResult<RemoteResponse> {
        debug!(
            method = %request.method,
            path = %request.path,
            stateful = request.stateful,
            "Issuing remote call"
        );

        let response = self.request_builder(session, &request)?.send().await?;
        let status = response.status().as_u16();
        let (set_cookies, token) = session_headers(response.headers());
        let mut body = response.text().await?;

        // A rejected token comes back as 403 with the token header set to
        // "Required" and often an empty body.
        if status == 403 && token.as_deref().is_some_and(|t| t.eq_ignore_ascii_case("required")) {
            body = format!("CSRF token validation failed. {body}");
        }

        let session = session.with_rotation(&set_cookies, token.as_deref());
        Ok(RemoteResponse {
            status,
            body,
            session,
        })
    }
}
