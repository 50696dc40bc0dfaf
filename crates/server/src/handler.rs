//! MCP server handler implementation.
//!
//! This module defines the main server handler that
//! routes tool calls to the appropriate implementations.

use std::sync::Arc;

use fieldmap_core::SyncCoordinator;
use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{
        tool::{ToolCallContext, ToolRouter},
        wrapper::Parameters,
    },
    model::{
        CallToolRequestParam, CallToolResult, Implementation, ListToolsResult, PaginatedRequestParam, ProtocolVersion,
        ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_router,
};

use crate::tools::entities::{
    EntitiesGetParams, EntitiesRefreshParams, EntitiesValuesParams, get_impl, refresh_impl, values_impl,
};
use crate::tools::sync_status::status_impl;

/// The main MCP server handler for fieldmap.
#[derive(Clone)]
pub struct FieldmapServer {
    coordinator: Arc<SyncCoordinator>,
    tool_router: ToolRouter<Self>,
}

/// Tool router implementation using the #[tool_router] macro.
///
/// This macro generates the routing logic that maps tool names to handler methods.
#[tool_router]
impl FieldmapServer {
    /// Create a new server handler around a sync coordinator.
    pub fn new(coordinator: Arc<SyncCoordinator>) -> Self {
        Self { coordinator, tool_router: Self::tool_router() }
    }

    /// Filtered entities of one type, resyncing first if the local snapshot is stale.
    #[tool(
        description = "Get projects, resources or billing locations for the map. Filters: exact field match, \
                       <field>Contains substring match, q for free-text search, mappable=true for plottable \
                       entities. Returns data, total (pre-filter count), source, stale and an optional warning."
    )]
    async fn entities_get(&self, params: Parameters<EntitiesGetParams>) -> Result<CallToolResult, McpError> {
        get_impl(&self.coordinator, params.0).await
    }

    #[tool(
        description = "Force a full resync of one entity type from the remote source. \
                       On failure the previous snapshot is kept and a warning returned."
    )]
    async fn entities_refresh(&self, params: Parameters<EntitiesRefreshParams>) -> Result<CallToolResult, McpError> {
        refresh_impl(&self.coordinator, params.0).await
    }

    #[tool(
        description = "Distinct values of one field among entities matching the given filters. \
                       Use to populate cascading filter dropdowns."
    )]
    async fn entities_values(&self, params: Parameters<EntitiesValuesParams>) -> Result<CallToolResult, McpError> {
        values_impl(&self.coordinator, params.0).await
    }

    #[tool(description = "Last sync time, record count and staleness of every entity table.")]
    async fn sync_status(&self) -> Result<CallToolResult, McpError> {
        status_impl(&self.coordinator).await
    }
}

impl ServerHandler for FieldmapServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "fieldmap-mcp".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self, _request: Option<PaginatedRequestParam>, _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, rmcp::model::ErrorData> {
        Ok(ListToolsResult { meta: None, tools: self.tool_router.list_all(), next_cursor: None })
    }

    async fn call_tool(
        &self, request: CallToolRequestParam, context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, rmcp::model::ErrorData> {
        self.tool_router
            .call(ToolCallContext::new(self, request, context))
            .await
    }
}
