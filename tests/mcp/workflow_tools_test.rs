//! Mutating tools: preview → confirm.

use adt_client::testing::ScriptedReply;

use super::harness::McpTestHarness;
use crate::common::{create_happy_path, LOCK_OK};

#[tokio::test]
async fn test_create_object_preview_then_execute() -> anyhow::Result<()> {
    let harness = McpTestHarness::setup(create_happy_path()).await?;
    let args = serde_json::json!({
        "kind": "class",
        "name": "zcl_demo",
        "package": "$TMP",
        "description": "Demo class",
        "source": "CLASS zcl_demo DEFINITION PUBLIC. ENDCLASS."
    });

    let preview = harness.call_tool("create_object", args.clone()).await?;
    assert_eq!(preview["status"], "preview", "{preview}");
    assert_eq!(preview["action"], "create_object");
    assert_eq!(preview["details"]["planned_steps"].as_array().unwrap().len(), 7);
    assert_eq!(harness.transport.call_count(), 0);

    let mut confirmed = args;
    confirmed["confirm"] = serde_json::json!(true);
    let result = harness.call_tool("create_object", confirmed).await?;
    assert_eq!(result["success"], true, "{result}");
    assert_eq!(result["state"], "completed");
    assert_eq!(result["descriptor"]["name"], "ZCL_DEMO");
    assert!(result["session"].is_null());
    assert_eq!(harness.transport.call_count(), 7);

    harness.teardown().await
}

#[tokio::test]
async fn test_delete_object_failure_reports_unlock() -> anyhow::Result<()> {
    let harness = McpTestHarness::setup(vec![
        ScriptedReply::ok(LOCK_OK),
        ScriptedReply::status(500, "Internal server error"),
        ScriptedReply::empty(),
    ])
    .await?;

    let result = harness
        .call_tool(
            "delete_object",
            serde_json::json!({ "kind": "program", "name": "zdemo", "confirm": true }),
        )
        .await?;

    assert_eq!(result["success"], false);
    assert_eq!(result["state"], "failed");
    let steps: Vec<&str> = result["steps"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["step"].as_str().unwrap())
        .collect();
    assert_eq!(steps, vec!["lock", "delete", "unlock"]);

    harness.teardown().await
}

#[tokio::test]
async fn test_unknown_kind_returns_structured_error() -> anyhow::Result<()> {
    let harness = McpTestHarness::setup(vec![]).await?;

    let result = harness
        .call_tool(
            "update_object",
            serde_json::json!({ "kind": "spreadsheet", "name": "zsheet", "confirm": true }),
        )
        .await?;

    assert_eq!(result["error"], "unknown_object_kind");
    assert!(result["message"].as_str().unwrap().contains("spreadsheet"));

    harness.teardown().await
}
