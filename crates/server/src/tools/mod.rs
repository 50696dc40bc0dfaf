//! MCP tool implementations.
//!
//! This module contains all tools exposed by the fieldmap server.

pub mod entities;
pub mod sync_status;

#[cfg(test)]
pub(crate) mod testing;

use fieldmap_core::{EntityType, Error};
use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use serde::Serialize;

/// Parse a tool's `entity_type` argument.
pub(crate) fn parse_entity_type(raw: &str) -> Result<EntityType, McpError> {
    raw.parse::<EntityType>().map_err(McpError::from)
}

/// Serialize a tool output as the single text content of a success result.
pub(crate) fn json_result<T: Serialize>(output: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(output)
        .map_err(|e| Error::InvalidInput(format!("Failed to serialize output: {e}")))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}
