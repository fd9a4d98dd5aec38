//! emissions_measure tool implementation.
//!
//! Measures emissions for a batch of inventory rows, answering from the cache
//! where possible and asking Scope3 for the rest.

use emissions_core::{Error, MeasureService, RequestRow};
use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Input parameters for the emissions_measure tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct MeasureParams {
    /// Inventory rows to measure (at least one).
    pub rows: Vec<RequestRow>,
}

/// Implementation of the emissions_measure tool.
pub async fn measure_impl(service: &MeasureService, params: MeasureParams) -> Result<CallToolResult, McpError> {
    let response = service.process(&params.rows).await.map_err(|e| {
        if e.is_retryable() {
            tracing::warn!("emissions measure failed: {}", e);
        } else {
            tracing::debug!("emissions measure rejected: {}", e);
        }
        e
    })?;

    tracing::info!(
        request_id = %response.request_id,
        rows = response.rows.len(),
        cached = response.rows.iter().filter(|r| r.cached).count(),
        "emissions measured"
    );

    let json = serde_json::to_string_pretty(&response)
        .map_err(|e| Error::Internal(format!("Failed to serialize response: {e}")))?;

    Ok(CallToolResult::success(vec![Content::text(json)]))
}
