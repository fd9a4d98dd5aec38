//! cache_get tool implementation.
//!
//! Looks up a single cached emissions record by key.

use chrono::Utc;
use emissions_core::{EmissionsRecord, EmissionsStore, Error, Expiry};
use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Parameters for the cache_get tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheGetParams {
    /// Cache key, e.g. `US-online-1000-inv-001`.
    pub key: String,
}

/// Output from the cache_get tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CacheGetOutput {
    pub key: String,
    pub record: EmissionsRecord,
    /// `timed` or `permanent`.
    pub expiry: String,
    /// RFC 3339 expiry time for timed entries.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_in_secs: Option<u64>,
}

/// Implementation of the cache_get tool.
pub async fn get_impl(store: &EmissionsStore, params: CacheGetParams) -> Result<CallToolResult, McpError> {
    let entry = store
        .lookup(&params.key)
        .ok_or_else(|| Error::CacheMiss(params.key.clone()))?;

    let expiry = match entry.expiry {
        Expiry::Timed(_) => "timed",
        Expiry::Permanent => "permanent",
    };
    let expires_at = entry
        .remaining
        .and_then(|left| chrono::Duration::from_std(left).ok())
        .map(|left| (Utc::now() + left).to_rfc3339());

    let output = CacheGetOutput {
        key: params.key,
        record: entry.record,
        expiry: expiry.to_string(),
        expires_at,
        expires_in_secs: entry.remaining.map(|left| left.as_secs()),
    };
    let json = serde_json::to_string_pretty(&output)
        .map_err(|e| Error::Internal(format!("Failed to serialize cache entry: {e}")))?;

    Ok(CallToolResult::success(vec![Content::text(json)]))
}
