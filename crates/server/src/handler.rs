//! MCP server handler implementation.
//!
//! This module defines the main server handler that
//! routes tool calls to the appropriate implementations.
use crate::tools::cache::{CacheGetParams, CachePurgeParams, get_impl, purge_impl};
use crate::tools::health::health_impl;
use crate::tools::{MeasureParams, measure_impl};

use emissions_core::{EmissionsStore, MeasureService};
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
use std::sync::Arc;

/// The main MCP server handler for emissions-mcp.
#[derive(Clone)]
pub struct EmissionsServer {
    tool_router: ToolRouter<Self>,
    service: MeasureService,
    store: Arc<EmissionsStore>,
}

/// Tool router implementation using the #[tool_router] macro.
///
/// This macro generates the routing logic that maps tool names to handler methods.
#[tool_router]
impl EmissionsServer {
    /// Create a new server handler over a measure service and the store backing it.
    pub fn new(service: MeasureService, store: Arc<EmissionsStore>) -> Self {
        Self { tool_router: Self::tool_router(), service, store }
    }

    /// Measure emissions for a batch of inventory rows.
    ///
    /// Cached rows are answered locally; the rest go to Scope3 in a single call.
    #[tool(
        description = "Measure carbon emissions for ad inventory rows. Cached rows are served locally, the rest are fetched from Scope3. Returns per-row emissions and a batch total."
    )]
    async fn emissions_measure(&self, params: Parameters<MeasureParams>) -> Result<CallToolResult, McpError> {
        measure_impl(&self.service, params.0).await
    }

    /// Look up a cached emissions record.
    #[tool(description = "Get a cached emissions record by key ({country}-{channel}-{impressions}-{inventoryId}).")]
    async fn cache_get(&self, params: Parameters<CacheGetParams>) -> Result<CallToolResult, McpError> {
        get_impl(&self.store, params.0).await
    }

    /// Purge cache entries.
    #[tool(description = "Purge expired cache entries. Set all=true to clear the whole cache, including priority entries.")]
    async fn cache_purge(&self, params: Parameters<CachePurgeParams>) -> Result<CallToolResult, McpError> {
        purge_impl(&self.store, params.0).await
    }

    /// Liveness check.
    #[tool(description = "Report server health and the number of cached entries.")]
    async fn health(&self) -> Result<CallToolResult, McpError> {
        health_impl(&self.store).await
    }
}

impl ServerHandler for EmissionsServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "emissions-mcp".into(),
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
