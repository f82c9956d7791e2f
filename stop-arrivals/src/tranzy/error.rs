//! Tranzy client error types.

/// Errors from fetching upstream transit data.
#[derive(Debug, thiserror::Error)]
pub enum TranzyError {
    /// Credentials rejected, or the key does not belong to the agency.
    #[error("unauthorized ({status}): check API key and agency id")]
    Unauthorized { status: u16 },

    /// Rate limited by the API
    #[error("rate limited by Tranzy API")]
    RateLimited,

    /// Network failure or timeout
    #[error("connection error: {0}")]
    Connectivity(#[from] reqwest::Error),

    /// API returned an unexpected status code
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    /// Response body did not decode
    #[error("JSON parse error on /{endpoint}: {message}")]
    Json {
        endpoint: &'static str,
        message: String,
    },

    /// Local feed files could not be read
    #[error("feed file error: {0}")]
    Feed(String),

    /// Client misconfigured
    #[error("not configured: {0}")]
    NotConfigured(String),
}

impl TranzyError {
    /// Whether a later attempt may succeed without changing configuration.
    pub fn is_transient(&self) -> bool {
        match self {
            TranzyError::Connectivity(_) | TranzyError::RateLimited => true,
            TranzyError::Api { status, .. } => *status >= 500,
            TranzyError::Unauthorized { .. }
            | TranzyError::Json { .. }
            | TranzyError::Feed(_)
            | TranzyError::NotConfigured(_) => false,
        }
    }
}
