//! Scope3 measure request types and validation.

use emissions_core::ResolveRow;
use serde::Serialize;

/// Breakdown requested for every measurement.
pub const MEASURE_FIELDS: &str = "emissionsBreakdown";

/// Request body for `POST /measure`.
///
/// The same flags are also sent as query parameters, as the API expects.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeasureRequest<'a> {
    pub rows: &'a [ResolveRow],
    pub include_rows: bool,
    pub latest: bool,
    pub fields: &'static str,
}

impl<'a> MeasureRequest<'a> {
    /// Request per-row results for the latest model version.
    pub fn new(rows: &'a [ResolveRow]) -> Self {
        Self { rows, include_rows: true, latest: true, fields: MEASURE_FIELDS }
    }

    /// Query string mirroring the body flags.
    pub fn query(&self) -> [(&'static str, String); 3] {
        [
            ("includeRows", self.include_rows.to_string()),
            ("latest", self.latest.to_string()),
            ("fields", self.fields.to_string()),
        ]
    }

    /// Validate the request before it is sent.
    pub fn validate(&self) -> Result<(), crate::scope3::Scope3Error> {
        if self.rows.is_empty() {
            return Err(crate::scope3::Scope3Error::InvalidRequest("rows cannot be empty".to_string()));
        }
        Ok(())
    }
}
