//! Shared helper functions for MCP tool implementations.

use serde::Serialize;

/// Phase of a two-phase confirmation flow.
///
/// Mutating tools are first invoked without confirmation to see which steps
/// would run, then re-invoked with `confirm: true` to perform them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmationPhase {
    Preview,
    Execute,
}

impl ConfirmationPhase {
    pub fn from_flag(confirm: bool) -> Self {
        if confirm {
            Self::Execute
        } else {
            Self::Preview
        }
    }
}

/// Build a structured error JSON string that LLMs can parse.
pub fn error_json(error_code: &str, message: &str) -> String {
    serde_json::json!({
        "error": error_code,
        "message": message,
    })
    .to_string()
}

/// Build a preview response for a mutating tool.
pub fn build_preview(action: &str, description: &str, details: serde_json::Value) -> serde_json::Value {
    serde_json::json!({
        "action": action,
        "status": "preview",
        "description": description,
        "details": details,
        "instruction": "Call this tool again with confirm: true to execute this action."
    })
}

/// Pretty JSON, or a structured serialization error.
pub fn to_pretty_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|e| error_json("serialization_error", &e.to_string()))
}
