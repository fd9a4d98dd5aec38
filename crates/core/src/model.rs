//! Request, record and response types for emissions measurement.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::Error;

/// Sentinel reported by the resolver when it has no coverage for a row.
pub const COVERAGE_MISSING: &str = "missing";

/// One unit of advertising inventory to be measured.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RequestRow {
    /// Country code, e.g. "US".
    pub country: String,
    /// Delivery channel, e.g. "online" or "tv".
    pub channel: String,
    /// Number of impressions; must be positive.
    pub impressions: i64,
    /// Inventory (property) identifier.
    pub inventory_id: String,
    /// Delivery time as an ISO-8601 UTC timestamp.
    #[serde(default)]
    pub utc_datetime: String,
    /// Priority rows are cached without expiry.
    #[serde(default)]
    pub is_priority: bool,
}

impl RequestRow {
    /// Check the fields the resolver requires.
    ///
    /// `index` is the row's position in its batch and is echoed in the error.
    pub fn validate(&self, index: usize) -> Result<(), Error> {
        if self.country.is_empty() {
            return Err(Error::invalid_row(index, format!("country is required for row {index}")));
        }
        if self.channel.is_empty() {
            return Err(Error::invalid_row(index, format!("channel is required for row {index}")));
        }
        if self.impressions <= 0 {
            return Err(Error::invalid_row(index, format!("impressions must be positive for row {index}")));
        }
        if self.inventory_id.is_empty() {
            return Err(Error::invalid_row(index, format!("inventoryId is required for row {index}")));
        }
        Ok(())
    }
}

/// A row as sent to the resolver: the request row minus its priority flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveRow {
    pub country: String,
    pub channel: String,
    pub impressions: i64,
    pub inventory_id: String,
    pub utc_datetime: String,
}

impl From<&RequestRow> for ResolveRow {
    fn from(row: &RequestRow) -> Self {
        Self {
            country: row.country.clone(),
            channel: row.channel.clone(),
            impressions: row.impressions,
            inventory_id: row.inventory_id.clone(),
            utc_datetime: row.utc_datetime.clone(),
        }
    }
}

/// Emissions data resolved for a single row; the value type of the cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct EmissionsRecord {
    pub property_id: i64,
    pub property_name: String,
    pub total_emissions: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inventory_coverage: Option<String>,
}

impl EmissionsRecord {
    /// Whether the resolver flagged this row as having no inventory coverage.
    ///
    /// Property identity is meaningless on such records.
    pub fn is_coverage_missing(&self) -> bool {
        self.inventory_coverage.as_deref() == Some(COVERAGE_MISSING)
    }
}

/// One row of a [`BatchResponse`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResponseRow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property_name: Option<String>,
    pub total_emissions: f64,
    /// True when the row was served from the cache.
    pub cached: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inventory_coverage: Option<String>,
}

impl ResponseRow {
    /// Build a response row, hiding property identity for uncovered records.
    pub fn from_record(record: &EmissionsRecord, cached: bool) -> Self {
        if record.is_coverage_missing() {
            return Self {
                property_id: None,
                property_name: None,
                total_emissions: 0.0,
                cached,
                inventory_coverage: Some(COVERAGE_MISSING.to_string()),
            };
        }

        Self {
            property_id: Some(record.property_id),
            property_name: Some(record.property_name.clone()),
            total_emissions: record.total_emissions,
            cached,
            inventory_coverage: None,
        }
    }
}

/// Aggregated answer to one measure call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct BatchResponse {
    /// Fresh identifier for this call.
    pub request_id: String,
    /// Sum of `total_emissions` across `rows`.
    pub total_emissions: f64,
    pub rows: Vec<ResponseRow>,
}

impl BatchResponse {
    pub fn new(request_id: String, rows: Vec<ResponseRow>) -> Self {
        let total_emissions = rows.iter().map(|r| r.total_emissions).sum();
        Self { request_id, total_emissions, rows }
    }
}
