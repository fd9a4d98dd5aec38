//! cache_purge tool implementation.
//!
//! Drops expired cache entries, or every entry when asked to.

use emissions_core::{EmissionsStore, Error};
use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Parameters for the cache_purge tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct CachePurgeParams {
    /// Also drop live and permanent entries.
    #[serde(default)]
    pub all: bool,
}

/// Output from the cache_purge tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CachePurgeOutput {
    /// Number of entries deleted.
    pub deleted: usize,
    /// Number of entries left in the cache.
    pub remaining: usize,
}

/// Implementation of the cache_purge tool.
pub async fn purge_impl(store: &EmissionsStore, params: CachePurgeParams) -> Result<CallToolResult, McpError> {
    let deleted = if params.all { store.clear() } else { store.purge_expired() };
    tracing::info!(all = params.all, deleted, "cache purged");

    let output = CachePurgeOutput { deleted, remaining: store.len() };
    let json = serde_json::to_string_pretty(&output)
        .map_err(|e| Error::Internal(format!("Failed to serialize purge result: {e}")))?;

    Ok(CallToolResult::success(vec![Content::text(json)]))
}
