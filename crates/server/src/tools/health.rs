//! health tool implementation.

use emissions_core::{EmissionsStore, Error};
use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Output from the health tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct HealthOutput {
    pub status: String,
    pub cached_entries: usize,
}

/// Implementation of the health tool.
pub async fn health_impl(store: &EmissionsStore) -> Result<CallToolResult, McpError> {
    let output = HealthOutput { status: "healthy".to_string(), cached_entries: store.len() };
    let json = serde_json::to_string_pretty(&output)
        .map_err(|e| Error::Internal(format!("Failed to serialize health: {e}")))?;

    Ok(CallToolResult::success(vec![Content::text(json)]))
}
