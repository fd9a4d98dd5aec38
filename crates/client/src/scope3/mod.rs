//! Scope3 measurement API client.
//!
//! Resolves emissions for inventory rows that are not in the cache.
//!
//! ### API contract
//!
//! - **Endpoint**: `POST {api_url}/measure?includeRows=true&latest=true&fields=emissionsBreakdown`
//! - **Authentication**: Bearer token in the `Authorization` header.
//! - **Body**: `{rows, includeRows, latest, fields}` with one row per input.
//! - **Response**: one result per input row, in input order.
//! - **Retries**: none; failures are surfaced to the caller.

pub mod error;
pub mod request;
pub mod response;

pub use error::Scope3Error;
pub use request::MeasureRequest;
pub use response::MeasureResponse;

use emissions_core::{EmissionsRecord, EmissionsResolver, Error, ResolveRow};
use reqwest::header;
use std::sync::Arc;
use std::time::{Duration, Instant};
use url::Url;

/// Default base URL for the Scope3 API.
const DEFAULT_API_URL: &str = "https://api.scope3.com/v2";

/// Default request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Default user agent.
const DEFAULT_USER_AGENT: &str = "emissions-cache/0.1";

/// Longest error body kept from a failed response.
const MAX_ERROR_BODY_CHARS: usize = 512;

/// Scope3 client configuration.
#[derive(Debug, Clone)]
pub struct Scope3Config {
    /// Base URL (default: https://api.scope3.com/v2).
    pub api_url: String,
    /// Bearer token.
    pub token: String,
    /// Request timeout (default: 5s).
    pub timeout: Duration,
    /// User-agent string (default: emissions-cache/0.x).
    pub user_agent: String,
}

impl Default for Scope3Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            token: String::new(),
            timeout: DEFAULT_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// Scope3 measurement API client.
#[derive(Debug, Clone)]
pub struct Scope3Client {
    http: reqwest::Client,
    config: Arc<Scope3Config>,
    measure_url: Url,
}

impl Scope3Client {
    /// Create a new Scope3 client with the given configuration.
    pub fn new(config: Scope3Config) -> Result<Self, Scope3Error> {
        if config.token.is_empty() {
            return Err(Scope3Error::MissingToken);
        }

        let measure_url = Url::parse(&format!("{}/measure", config.api_url.trim_end_matches('/')))
            .map_err(|e| Scope3Error::InvalidUrl(format!("{}: {e}", config.api_url)))?;

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Scope3Error::Network(Arc::new(e)))?;

        Ok(Self { http, config: Arc::new(config), measure_url })
    }

    /// Measure emissions for a batch of rows.
    ///
    /// The response holds one record per row, in row order.
    pub async fn measure(&self, rows: &[ResolveRow]) -> Result<MeasureResponse, Scope3Error> {
        let req = MeasureRequest::new(rows);
        req.validate()?;

        let start = Instant::now();
        tracing::debug!("requesting Scope3 measurements: rows={}", rows.len());

        let http_response = self
            .http
            .post(self.measure_url.clone())
            .query(&req.query())
            .bearer_auth(&self.config.token)
            .header(header::ACCEPT, "application/json")
            .header(header::USER_AGENT, &self.config.user_agent)
            .json(&req)
            .send()
            .await?;

        let status = http_response.status();
        tracing::debug!("Scope3 API response status: {}", status);

        if status == 401 || status == 403 {
            return Err(Scope3Error::AuthError);
        }

        if status == 429 {
            return Err(Scope3Error::RateLimited);
        }

        if !status.is_success() {
            let body = http_response.text().await.unwrap_or_default();
            return Err(Scope3Error::HttpError {
                status: status.as_u16(),
                body: body.chars().take(MAX_ERROR_BODY_CHARS).collect(),
            });
        }

        let bytes = http_response.bytes().await?;
        let api_response: response::MeasureApiResponse =
            serde_json::from_slice(&bytes).map_err(|e| Scope3Error::Parse(e.to_string()))?;

        let response = MeasureResponse::from(api_response);
        tracing::debug!(
            "measure completed in {:?}, {} rows, scope3 request id {:?}",
            start.elapsed(),
            response.rows.len(),
            response.request_id
        );

        Ok(response)
    }
}

#[async_trait::async_trait]
impl EmissionsResolver for Scope3Client {
    async fn resolve(&self, batch: &[ResolveRow]) -> Result<Vec<EmissionsRecord>, Error> {
        Ok(self.measure(batch).await?.rows)
    }
}
