//! Workflow requests and object payloads.

use bon::Builder;
use serde::{Deserialize, Serialize};

use super::descriptor::ObjectDescriptor;
use super::session::SessionContext;

/// Kind-specific payload.
///
/// Only `description` and `source` are interpreted by the built-in executors;
/// everything else a kind needs (root entity, master language, field lists)
/// travels in `properties` untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub properties: serde_json::Map<String, serde_json::Value>,
}

impl ObjectPayload {
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.properties.insert(key.into(), value);
        self
    }

    /// String property lookup.
    pub fn property_str(&self, key: &str) -> Option<&str> {
        self.properties.get(key).and_then(serde_json::Value::as_str)
    }
}

/// Input of a high-level workflow.
#[derive(Debug, Clone, Builder)]
pub struct WorkflowRequest {
    pub descriptor: ObjectDescriptor,
    #[builder(default)]
    pub payload: ObjectPayload,
    /// Session to restore instead of connecting afresh
    pub session: Option<SessionContext>,
    /// Run the terminal Activate step
    #[builder(default = true)]
    pub activate: bool,
    /// Run Validate before Create (create workflow only)
    #[builder(default = true)]
    pub validate: bool,
    /// Run Check before Unlock
    #[builder(default = true)]
    pub check: bool,
}
