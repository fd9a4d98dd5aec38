//! Scope3 measure response types and normalization.

use emissions_core::EmissionsRecord;
use serde::Deserialize;

/// Raw response from `POST /measure`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeasureApiResponse {
    #[serde(default)]
    pub request_id: Option<String>,
    #[serde(default)]
    pub total_emissions: f64,
    #[serde(default)]
    pub rows: Vec<ApiRow>,
}

/// One measured row from Scope3.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiRow {
    #[serde(default)]
    pub total_emissions: f64,
    /// Property identity; absent on rows without inventory coverage.
    #[serde(default)]
    pub internal: Option<InternalData>,
    #[serde(default)]
    pub inventory_coverage: Option<String>,
}

/// Property metadata returned by Scope3.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InternalData {
    #[serde(default)]
    pub property_id: i64,
    #[serde(default)]
    pub property_name: String,
}

/// Normalized measure response for internal use.
#[derive(Debug, Clone)]
pub struct MeasureResponse {
    /// Scope3's own request id, kept for log correlation only.
    pub request_id: Option<String>,
    pub total_emissions: f64,
    pub rows: Vec<EmissionsRecord>,
}

impl From<ApiRow> for EmissionsRecord {
    fn from(row: ApiRow) -> Self {
        let internal = row.internal.unwrap_or_default();
        EmissionsRecord {
            property_id: internal.property_id,
            property_name: internal.property_name,
            total_emissions: row.total_emissions,
            inventory_coverage: row.inventory_coverage,
        }
    }
}

impl From<MeasureApiResponse> for MeasureResponse {
    fn from(raw: MeasureApiResponse) -> Self {
        MeasureResponse {
            request_id: raw.request_id,
            total_emissions: raw.total_emissions,
            rows: raw.rows.into_iter().map(EmissionsRecord::from).collect(),
        }
    }
}
