//! Parameter structs for all MCP tools.

use schemars::JsonSchema;
use serde::Deserialize;

use adt_shared::{AdtError, ObjectDescriptor, ObjectKind, ObjectPayload};

// ── shared ──

/// Identity of the object a tool acts on.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ObjectRefParams {
    /// Object kind tag or ADT type code.
    #[schemars(description = "Object kind: a tag from list_object_kinds (e.g. 'class') or an ADT type code (e.g. 'CLAS/OC')")]
    pub kind: String,
    /// Object name; uppercased before use.
    #[schemars(description = "Object name (e.g. 'ZCL_DEMO'); case-insensitive")]
    pub name: String,
    #[schemars(description = "Package the object belongs to (e.g. '$TMP')")]
    pub package: Option<String>,
    #[schemars(description = "Parent package (package kind only)")]
    pub super_package: Option<String>,
    #[schemars(description = "Containing object: function group for function modules")]
    pub parent: Option<String>,
    #[schemars(description = "Transport request number for non-local packages")]
    pub transport_request: Option<String>,
}

impl ObjectRefParams {
    pub fn to_descriptor(&self) -> Result<ObjectDescriptor, AdtError> {
        let kind: ObjectKind = self.kind.parse()?;
        let mut descriptor = ObjectDescriptor::new(kind, &self.name);
        if let Some(package) = &self.package {
            descriptor = descriptor.with_package(package);
        }
        if let Some(super_package) = &self.super_package {
            descriptor = descriptor.with_super_package(super_package);
        }
        if let Some(parent) = &self.parent {
            descriptor = descriptor.with_parent(parent);
        }
        if let Some(transport_request) = &self.transport_request {
            descriptor = descriptor.with_transport_request(transport_request);
        }
        Ok(descriptor)
    }
}

fn payload(
    description: Option<String>,
    source: Option<String>,
    properties: Option<serde_json::Map<String, serde_json::Value>>,
) -> ObjectPayload {
    ObjectPayload {
        description,
        source,
        properties: properties.unwrap_or_default(),
    }
}

// ── create_object ──

/// Parameters for the `create_object` tool.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateObjectParams {
    #[serde(flatten)]
    pub object: ObjectRefParams,
    #[schemars(description = "Short description of the new object")]
    pub description: Option<String>,
    #[schemars(description = "Initial source code (source-based kinds)")]
    pub source: Option<String>,
    #[schemars(description = "Additional kind-specific properties, passed through untouched")]
    pub properties: Option<serde_json::Map<String, serde_json::Value>>,
    #[schemars(description = "Run the name validation first (server default when omitted)")]
    pub validate: Option<bool>,
    #[schemars(description = "Run a syntax check before unlocking (server default when omitted)")]
    pub check: Option<bool>,
    #[schemars(description = "Activate after unlocking (server default when omitted)")]
    pub activate: Option<bool>,
    /// Set to true to execute. When false (default), returns a preview.
    #[schemars(description = "Set to true to execute. When false (default), returns a preview of the planned steps.")]
    #[serde(default)]
    pub confirm: bool,
}

impl CreateObjectParams {
    pub fn payload(&self) -> ObjectPayload {
        payload(self.description.clone(), self.source.clone(), self.properties.clone())
    }
}

// ── update_object ──

/// Parameters for the `update_object` tool.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct UpdateObjectParams {
    #[serde(flatten)]
    pub object: ObjectRefParams,
    #[schemars(description = "New source code (source-based kinds)")]
    pub source: Option<String>,
    #[schemars(description = "New description (metadata kinds)")]
    pub description: Option<String>,
    #[schemars(description = "Additional kind-specific properties, passed through untouched")]
    pub properties: Option<serde_json::Map<String, serde_json::Value>>,
    #[schemars(description = "Run a syntax check before unlocking (server default when omitted)")]
    pub check: Option<bool>,
    #[schemars(description = "Activate after unlocking (server default when omitted)")]
    pub activate: Option<bool>,
    #[schemars(description = "Set to true to execute. When false (default), returns a preview of the planned steps.")]
    #[serde(default)]
    pub confirm: bool,
}

impl UpdateObjectParams {
    pub fn payload(&self) -> ObjectPayload {
        payload(self.description.clone(), self.source.clone(), self.properties.clone())
    }
}

// ── delete_object ──

/// Parameters for the `delete_object` tool.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct DeleteObjectParams {
    #[serde(flatten)]
    pub object: ObjectRefParams,
    #[schemars(description = "Set to true to execute. When false (default), returns a preview.")]
    #[serde(default)]
    pub confirm: bool,
}

// ── object_operation ──

/// Parameters for the `object_operation` tool.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct ObjectOperationParams {
    #[schemars(description = "Lifecycle verb: validate, create, lock, update, check, unlock, activate or delete")]
    pub step: String,
    #[serde(flatten)]
    pub object: ObjectRefParams,
    pub description: Option<String>,
    pub source: Option<String>,
    pub properties: Option<serde_json::Map<String, serde_json::Value>>,
    /// Session object returned by a previous `object_operation` call.
    #[schemars(description = "The 'session' object from a previous object_operation result; a fresh session is opened when omitted")]
    pub session: Option<serde_json::Value>,
    /// Lock handle object returned by a previous `lock` operation.
    #[schemars(description = "The 'lock_handle' object from a previous lock result; required by update, unlock and delete")]
    pub lock_handle: Option<serde_json::Value>,
    #[schemars(description = "Set to true to execute create, update or delete. Other verbs run immediately.")]
    #[serde(default)]
    pub confirm: bool,
}

impl ObjectOperationParams {
    pub fn payload(&self) -> ObjectPayload {
        payload(self.description.clone(), self.source.clone(), self.properties.clone())
    }
}
