//! MCP ServerHandler implementation for ADT object lifecycles.
//!
//! - `list_object_kinds`: supported kinds and the verbs each one supports
//! - `create_object`: Validate → Create → Lock → Update → Check → Unlock → Activate (preview → confirm)
//! - `update_object`: Lock → Update → Check → Unlock → Activate (preview → confirm)
//! - `delete_object`: Lock → Delete (preview → confirm)
//! - `object_operation`: one lifecycle verb with an explicit session and lock handle

use std::sync::Arc;

use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{Implementation, ProtocolVersion, ServerCapabilities, ServerInfo};
use rmcp::{tool, tool_handler, tool_router, ServerHandler};

use adt_orchestration::WorkflowOrchestrator;
use adt_shared::config::WorkflowPolicyConfig;

use crate::tools::lifecycle;
use crate::tools::*;

/// ADT MCP server handler.
#[derive(Debug, Clone)]
pub struct AdtMcpServer {
    tool_router: ToolRouter<Self>,
    orchestrator: Arc<WorkflowOrchestrator>,
    policy: WorkflowPolicyConfig,
}

impl AdtMcpServer {
    pub fn new(orchestrator: WorkflowOrchestrator, policy: WorkflowPolicyConfig) -> Self {
        Self {
            tool_router: Self::tool_router(),
            orchestrator: Arc::new(orchestrator),
            policy,
        }
    }

    pub fn orchestrator(&self) -> &WorkflowOrchestrator {
        &self.orchestrator
    }
}

#[tool_handler(router = self.tool_router)]
impl ServerHandler for AdtMcpServer {
    fn get_info(&self) -> ServerInfo {
        let instructions = "Manages the lifecycle of ABAP development objects over ADT.\n\
             Start with list_object_kinds to see the supported kinds and verbs.\n\
             Workflows: create_object, update_object and delete_object run the whole \
             lock → change → unlock sequence and always release the lock. \
             They require confirm: true. Always preview first (omit confirm), show the \
             planned steps to the user, then call again with confirm: true after approval.\n\
             Low level: object_operation runs one verb; pass the 'session' and 'lock_handle' \
             objects from earlier results back in to chain lock → update → unlock by hand."
            .to_string();

        ServerInfo {
            protocol_version: ProtocolVersion::V_2025_03_26,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "adt-mcp".to_string(),
                title: Some("ADT MCP Server".to_string()),
                version: env!("CARGO_PKG_VERSION").to_string(),
                description: Some(
                    "MCP server exposing ADT development-object lifecycle workflows: \
                     create, update, delete and single operations"
                        .to_string(),
                ),
                icons: None,
                website_url: None,
            },
            instructions: Some(instructions),
        }
    }
}

#[tool_router(router = tool_router)]
impl AdtMcpServer {
    #[tool(
        name = "list_object_kinds",
        description = "List the supported development object kinds with their ADT type codes and the lifecycle verbs each kind supports."
    )]
    pub async fn list_object_kinds(&self) -> String {
        lifecycle::list_object_kinds(&self.orchestrator)
    }

    #[tool(
        name = "create_object",
        description = "Create a development object and populate it: Validate → Create → Lock → Update → Check → Unlock → Activate. The lock is always released. Without confirm: true, returns a preview of the planned steps."
    )]
    pub async fn create_object(&self, Parameters(params): Parameters<CreateObjectParams>) -> String {
        lifecycle::create_object(&self.orchestrator, &self.policy, params).await
    }

    #[tool(
        name = "update_object",
        description = "Update an existing object's source or metadata: Lock → Update → Check → Unlock → Activate. The lock is always released. Without confirm: true, returns a preview of the planned steps."
    )]
    pub async fn update_object(&self, Parameters(params): Parameters<UpdateObjectParams>) -> String {
        lifecycle::update_object(&self.orchestrator, &self.policy, params).await
    }

    #[tool(
        name = "delete_object",
        description = "Delete a development object: Lock → Delete, unlocking again if the delete fails. Without confirm: true, returns a preview."
    )]
    pub async fn delete_object(&self, Parameters(params): Parameters<DeleteObjectParams>) -> String {
        lifecycle::delete_object(&self.orchestrator, params).await
    }

    #[tool(
        name = "object_operation",
        description = "Run exactly one lifecycle verb (validate, create, lock, update, check, unlock, activate, delete). The result carries the session and, for lock, the lock handle to pass into the next call. Create, update and delete need confirm: true."
    )]
    pub async fn object_operation(&self, Parameters(params): Parameters<ObjectOperationParams>) -> String {
        lifecycle::object_operation(&self.orchestrator, params).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adt_client::testing::ScriptedTransport;

    fn server() -> AdtMcpServer {
        let orchestrator = WorkflowOrchestrator::with_adt_defaults(Arc::new(ScriptedTransport::new()));
        AdtMcpServer::new(orchestrator, WorkflowPolicyConfig::default())
    }

    #[test]
    fn test_server_info() {
        let info = server().get_info();

        assert_eq!(info.server_info.name, "adt-mcp");
        assert_eq!(info.server_info.version, env!("CARGO_PKG_VERSION"));
        let instructions = info.instructions.unwrap();
        assert!(instructions.contains("list_object_kinds"));
        assert!(instructions.contains("confirm: true"));
    }

    #[test]
    fn test_router_registers_every_tool() {
        let server = server();
        let mut names: Vec<String> = server
            .tool_router
            .list_all()
            .into_iter()
            .map(|tool| tool.name.to_string())
            .collect();
        names.sort();

        assert_eq!(
            names,
            vec![
                "create_object",
                "delete_object",
                "list_object_kinds",
                "object_operation",
                "update_object",
            ]
        );
    }

    #[tokio::test]
    async fn test_delete_preview_through_handler() {
        let params = DeleteObjectParams {
            object: ObjectRefParams {
                kind: "class".to_string(),
                name: "zcl_demo".to_string(),
                package: None,
                super_package: None,
                parent: None,
                transport_request: None,
            },
            confirm: false,
        };

        let result = server().delete_object(Parameters(params)).await;
        let parsed: serde_json::Value = serde_json::from_str(&result).unwrap();

        assert_eq!(parsed["status"], "preview");
        assert_eq!(parsed["action"], "delete_object");
    }
}
