//! ADT MCP Server
//!
//! Model Context Protocol server exposing the create, update and delete
//! lifecycle workflows for ADT development objects over stdio.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use rmcp::ServiceExt;

use adt_client::HttpTransport;
use adt_mcp::server::AdtMcpServer;
use adt_orchestration::WorkflowOrchestrator;
use adt_shared::config::AdtConfig;
use adt_shared::logging::init_tracing;

#[derive(Debug, Parser)]
#[command(name = "adt-mcp", version, about = "MCP server for ADT object lifecycle workflows")]
struct Cli {
    /// Configuration file (defaults to ./adt.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = AdtConfig::load_from(cli.config.as_deref())?;
    init_tracing(&config.logging)?;

    let transport = Arc::new(HttpTransport::from_config(&config.connection, &config.timeouts)?);
    tracing::info!(base_url = %transport.base_url(), "adt-mcp starting (stdio transport)");

    let orchestrator = WorkflowOrchestrator::from_config(transport, &config);
    let server = AdtMcpServer::new(orchestrator, config.workflow.clone());

    let service = server.serve(rmcp::transport::io::stdio()).await?;
    service.waiting().await?;

    Ok(())
}
