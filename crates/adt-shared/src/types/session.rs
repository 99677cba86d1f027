//! Session continuity state.
//!
//! A [`SessionContext`] is the bundle of identity and credentials the remote
//! system needs to treat a sequence of calls as one logical session: cookies
//! and the anti-CSRF token. The orchestrator never interprets it; it only
//! threads it from one remote call to the next and replaces it whenever a
//! response rotates cookies or the token.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Session identity and credentials, replaced (never mutated in place) after
/// every remote call that rotates them.
///
/// `cookies` is always the rendered header of `cookie_store`. A persisted
/// context carrying only one of the two is reconciled on deserialization.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawSessionContext")]
pub struct SessionContext {
    session_id: Option<String>,
    cookies: Option<String>,
    csrf_token: Option<String>,
    cookie_store: BTreeMap<String, String>,
}

#[derive(Deserialize)]
struct RawSessionContext {
    #[serde(default)]
    session_id: Option<String>,
    #[serde(default)]
    cookies: Option<String>,
    #[serde(default)]
    csrf_token: Option<String>,
    #[serde(default)]
    cookie_store: BTreeMap<String, String>,
}

impl From<RawSessionContext> for SessionContext {
    fn from(raw: RawSessionContext) -> Self {
        let cookie_store = if raw.cookie_store.is_empty() {
            raw.cookies.as_deref().map(parse_cookie_header).unwrap_or_default()
        } else {
            raw.cookie_store
        };
        Self::restore(raw.session_id, cookie_store, raw.csrf_token)
    }
}

impl SessionContext {
    /// An empty context: no identity, no cookies, no token.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A fresh context with a newly assigned logical session id.
    pub fn fresh() -> Self {
        Self {
            session_id: Some(Uuid::new_v4().to_string()),
            ..Self::default()
        }
    }

    /// Restore a context from values a caller persisted earlier.
    pub fn restore(
        session_id: Option<String>,
        cookie_store: BTreeMap<String, String>,
        csrf_token: Option<String>,
    ) -> Self {
        let cookies = render_cookie_header(&cookie_store);
        Self {
            session_id,
            cookies,
            csrf_token,
            cookie_store,
        }
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    /// Rendered `Cookie` header value, if any cookie is held.
    pub fn cookies(&self) -> Option<&str> {
        self.cookies.as_deref()
    }

    pub fn csrf_token(&self) -> Option<&str> {
        self.csrf_token.as_deref()
    }

    pub fn cookie_store(&self) -> &BTreeMap<String, String> {
        &self.cookie_store
    }

    /// True once a CSRF token has been negotiated.
    pub fn is_established(&self) -> bool {
        self.csrf_token.is_some()
    }

    /// Successor context after a response.
    ///
    /// `set_cookies` are raw `Set-Cookie` header values. A cookie with an empty
    /// value or `Max-Age=0` is dropped from the store. The token is replaced
    /// only when the response carried a usable one.
    pub fn with_rotation<S: AsRef<str>>(&self, set_cookies: &[S], csrf_token: Option<&str>) -> Self {
        let mut cookie_store = self.cookie_store.clone();
        for raw in set_cookies {
            if let Some((name, value, expired)) = parse_set_cookie(raw.as_ref()) {
                if expired || value.is_empty() {
                    cookie_store.remove(&name);
                } else {
                    cookie_store.insert(name, value);
                }
            }
        }

        let csrf_token = match csrf_token.map(str::trim) {
            Some(token) if is_usable_token(token) => Some(token.to_string()),
            _ => self.csrf_token.clone(),
        };

        Self {
            session_id: self.session_id.clone(),
            cookies: render_cookie_header(&cookie_store),
            csrf_token,
            cookie_store,
        }
    }

    /// Successor context carrying a new CSRF token.
    pub fn with_csrf_token(&self, token: impl Into<String>) -> Self {
        Self {
            csrf_token: Some(token.into()),
            ..self.clone()
        }
    }
}

impl fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionContext")
            .field("session_id", &self.session_id)
            .field("cookie_names", &self.cookie_store.keys().collect::<Vec<_>>())
            .field(
                "csrf_token",
                &self.csrf_token.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

/// The remote system answers a token fetch on an unauthenticated request with
/// the literal `Required`; that is a request for a token, not a token.
fn is_usable_token(token: &str) -> bool {
    !token.is_empty() && !token.eq_ignore_ascii_case("required") && !token.eq_ignore_ascii_case("fetch")
}

fn render_cookie_header(store: &BTreeMap<String, String>) -> Option<String> {
    if store.is_empty() {
        return None;
    }
    Some(
        store
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect::<Vec<_>>()
            .join("; "),
    )
}

/// Parses a rendered `Cookie` header (`a=1; b=2`).
fn parse_cookie_header(header: &str) -> BTreeMap<String, String> {
    header
        .split(';')
        .filter_map(|pair| pair.split_once('='))
        .filter(|(name, _)| !name.trim().is_empty())
        .map(|(name, value)| (name.trim().to_string(), value.trim().to_string()))
        .collect()
}

/// Returns `(name, value, expired)` for a `Set-Cookie` header value.
fn parse_set_cookie(raw: &str) -> Option<(String, String, bool)> {
    let mut parts = raw.split(';');
    let (name, value) = parts.next()?.split_once('=')?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }

    let expired = parts.any(|attr| {
        attr.split_once('=').is_some_and(|(key, val)| {
            key.trim().eq_ignore_ascii_case("max-age") && val.trim().parse::<i64>().is_ok_and(|age| age <= 0)
        })
    });

    Some((name.to_string(), value.trim().to_string(), expired))
}
