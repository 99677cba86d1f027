//! Lock handles.

use serde::{Deserialize, Serialize};

use super::session::SessionContext;

/// Opaque token proving exclusive edit rights on one object within one
/// session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockHandle {
    value: String,
    session_id: Option<String>,
    object_uri: String,
}

impl LockHandle {
    /// Bind a raw handle to the session and object it was obtained for.
    pub fn new(value: impl Into<String>, session: &SessionContext, object_uri: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            session_id: session.session_id().map(str::to_string),
            object_uri: object_uri.into(),
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    pub fn object_uri(&self) -> &str {
        &self.object_uri
    }

    /// Whether the handle may be used under `session`.
    ///
    /// A handle obtained under an identified session is only valid in that
    /// same session; using it anywhere else is a likely failure.
    pub fn is_bound_to(&self, session: &SessionContext) -> bool {
        match (self.session_id.as_deref(), session.session_id()) {
            (Some(bound), Some(current)) => bound == current,
            (Some(_), None) => false,
            (None, _) => true,
        }
    }
}
