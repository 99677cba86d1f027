//! ADT MCP Server library.
//!
//! Provides the [`server::AdtMcpServer`] MCP server handler and the tool
//! parameter types. Used by the `adt-mcp` binary and available for
//! integration testing.

pub mod server;
pub mod tools;
