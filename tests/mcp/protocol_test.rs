//! Tool discovery and the read-only tool over the MCP protocol.

use super::harness::McpTestHarness;

#[tokio::test]
async fn test_list_tools() -> anyhow::Result<()> {
    let harness = McpTestHarness::setup(vec![]).await?;

    let tools = harness.mcp_client.list_tools(None).await?;
    let mut names: Vec<&str> = tools.tools.iter().map(|t| t.name.as_ref()).collect();
    names.sort_unstable();
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

    let create = tools
        .tools
        .iter()
        .find(|t| t.name == "create_object")
        .expect("create_object registered");
    let schema = serde_json::Value::Object(create.input_schema.as_ref().clone());
    assert!(schema["properties"]["confirm"].is_object(), "{schema}");
    assert!(schema["properties"]["kind"].is_object(), "{schema}");

    harness.teardown().await
}

#[tokio::test]
async fn test_list_object_kinds_over_protocol() -> anyhow::Result<()> {
    let harness = McpTestHarness::setup(vec![]).await?;

    let kinds = harness
        .call_tool("list_object_kinds", serde_json::json!({}))
        .await?;

    assert_eq!(kinds["count"], 15);
    assert!(kinds["kinds"]
        .as_array()
        .unwrap()
        .iter()
        .any(|k| k["kind"] == "function_module" && k["requires_parent"] == true));
    assert_eq!(harness.transport.call_count(), 0);

    harness.teardown().await
}
