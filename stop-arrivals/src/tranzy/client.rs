//! Tranzy OpenData HTTP client.
//!
//! Provides async methods for the five record-array endpoints used by the
//! arrival engine. Handles authentication headers and maps HTTP failures to
//! [`TranzyError`] kinds; it never retries.

use reqwest::header::{ACCEPT, HeaderMap, HeaderName, HeaderValue};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::engine::TransitFeed;

use super::error::TranzyError;
use super::types::{RouteDto, StopDto, StopTimeDto, TripDto, VehicleDto, decode_records};

/// Default base URL for the Tranzy OpenData API.
const DEFAULT_BASE_URL: &str = "https://api.tranzy.ai/v1/opendata";

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// Configuration for the Tranzy client.
#[derive(Debug, Clone)]
pub struct TranzyConfig {
    /// API key sent as `X-API-KEY`
    pub api_key: String,
    /// Agency id sent as `X-Agency-Id`
    pub agency_id: String,
    /// Base URL for the API (defaults to production Tranzy)
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl TranzyConfig {
    /// Create a new config for the given key and agency.
    pub fn new(api_key: impl Into<String>, agency_id: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            agency_id: agency_id.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Set a custom base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set request timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

/// Tranzy OpenData API client.
#[derive(Debug, Clone)]
pub struct TranzyClient {
    http: reqwest::Client,
    base_url: String,
}

impl TranzyClient {
    /// Create a new client with the given configuration.
    pub fn new(config: TranzyConfig) -> Result<Self, TranzyError> {
        if config.api_key.is_empty() {
            return Err(TranzyError::NotConfigured("API key is empty".to_string()));
        }

        let mut headers = HeaderMap::new();
        let api_key = HeaderValue::from_str(&config.api_key)
            .map_err(|_| TranzyError::NotConfigured("invalid API key format".to_string()))?;
        let agency = HeaderValue::from_str(&config.agency_id)
            .map_err(|_| TranzyError::NotConfigured("invalid agency id format".to_string()))?;
        headers.insert(HeaderName::from_static("x-api-key"), api_key);
        headers.insert(HeaderName::from_static("x-agency-id"), agency);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Fetch one record-array endpoint.
    async fn get_records<T: DeserializeOwned>(
        &self,
        endpoint: &'static str,
    ) -> Result<Vec<T>, TranzyError> {
        let url = format!("{}/{}", self.base_url, endpoint);
        debug!(%url, "fetching");

        let response = self.http.get(&url).send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            return Err(TranzyError::Unauthorized {
                status: status.as_u16(),
            });
        }

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(TranzyError::RateLimited);
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TranzyError::Api {
                status: status.as_u16(),
                message: body.chars().take(200).collect(),
            });
        }

        let body = response.text().await?;

        let decoded = decode_records(&body).map_err(|e| TranzyError::Json {
            endpoint,
            message: e.to_string(),
        })?;
        if decoded.dropped > 0 {
            warn!(endpoint, dropped = decoded.dropped, "skipped undecodable records");
        }
        Ok(decoded.records)
    }

    /// Check that the key and agency are accepted.
    pub async fn test_connection(&self) -> Result<(), TranzyError> {
        self.get_records::<RouteDto>("routes").await.map(|_| ())
    }
}

impl TransitFeed for TranzyClient {
    async fn fetch_routes(&self) -> Result<Vec<RouteDto>, TranzyError> {
        self.get_records("routes").await
    }

    async fn fetch_stops(&self) -> Result<Vec<StopDto>, TranzyError> {
        self.get_records("stops").await
    }

    async fn fetch_trips(&self) -> Result<Vec<TripDto>, TranzyError> {
        self.get_records("trips").await
    }

    async fn fetch_stop_times(&self) -> Result<Vec<StopTimeDto>, TranzyError> {
        self.get_records("stop_times").await
    }

    async fn fetch_vehicles(&self) -> Result<Vec<VehicleDto>, TranzyError> {
        self.get_records("vehicles").await
    }
}
