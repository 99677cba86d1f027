//! MCP server/client pair over `tokio::io::duplex`.

#![allow(dead_code)]

use std::sync::Arc;

use anyhow::Result;
use rmcp::model::{CallToolRequestParams, ClientInfo};
use rmcp::service::{RoleClient, RunningService};
use rmcp::{ClientHandler, ServiceExt};
use serde_json::Value;
use tokio::task::JoinHandle;

use adt_client::testing::{ScriptedReply, ScriptedTransport};
use adt_core::shared::config::WorkflowPolicyConfig;
use adt_core::WorkflowOrchestrator;
use adt_mcp::server::AdtMcpServer;

#[derive(Debug, Clone, Default)]
pub(super) struct TestClient;

impl ClientHandler for TestClient {
    fn get_info(&self) -> ClientInfo {
        ClientInfo::default()
    }
}

pub struct McpTestHarness {
    pub mcp_client: RunningService<RoleClient, TestClient>,
    pub transport: Arc<ScriptedTransport>,
    server_handle: JoinHandle<Result<()>>,
}

impl McpTestHarness {
    pub async fn setup(replies: Vec<ScriptedReply>) -> Result<Self> {
        let transport = Arc::new(ScriptedTransport::with_replies(replies));
        let orchestrator = WorkflowOrchestrator::with_adt_defaults(transport.clone());
        let server = AdtMcpServer::new(orchestrator, WorkflowPolicyConfig::default());
        let (server_transport, client_transport) = tokio::io::duplex(65536);

        let server_handle = tokio::spawn(async move {
            let service = server.serve(server_transport).await?;
            service.waiting().await?;
            anyhow::Ok(())
        });

        let mcp_client = TestClient.serve(client_transport).await?;

        Ok(Self {
            mcp_client,
            transport,
            server_handle,
        })
    }

    /// Call an MCP tool and parse the text response as JSON.
    pub async fn call_tool(&self, name: &str, args: Value) -> Result<Value> {
        let result = self
            .mcp_client
            .call_tool(CallToolRequestParams {
                meta: None,
                name: name.to_string().into(),
                arguments: args.as_object().cloned(),
                task: None,
            })
            .await?;

        let text = result
            .content
            .first()
            .and_then(|c| c.raw.as_text())
            .map(|t| t.text.clone())
            .ok_or_else(|| anyhow::anyhow!("No text content in tool response"))?;

        Ok(serde_json::from_str(&text)?)
    }

    pub async fn teardown(self) -> Result<()> {
        self.mcp_client.cancel().await?;
        self.server_handle.await??;
        Ok(())
    }
}
