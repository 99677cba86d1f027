//! MCP tool implementations and parameter types.
//!
//! All parameter structs derive `Deserialize + JsonSchema` for MCP tool
//! registration. Tool functions return pretty JSON strings.

pub mod helpers;
pub mod lifecycle;
pub mod params;

pub use helpers::error_json;
pub use params::*;
