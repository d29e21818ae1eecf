//! Error types for chatrelay

use crate::provider::ProviderId;
use thiserror::Error;

/// Main error type for chatrelay
#[derive(Debug, Error)]
pub enum RelayError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Provider has no entry in the routing table
    #[error("Provider '{0}' is not configured. Add it to providers.json with an `endpoint`.")]
    ProviderNotConfigured(ProviderId),

    /// No credentials configured for a provider
    #[error("No API keys available for '{0}'. Set {env} or add keys in providers.json", env = .0.default_key_env())]
    EmptyPool(ProviderId),

    /// Request rejected before anything was sent
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Provider answered with a non-2xx status
    #[error("Provider '{provider}' returned HTTP {status}: {body}")]
    ProviderHttp {
        provider: ProviderId,
        status: u16,
        body: String,
    },

    /// Provider answered 2xx but the body did not have the expected shape
    #[error("Unexpected response from '{provider}': {message}")]
    ProviderResponse {
        provider: ProviderId,
        message: String,
    },

    /// HTTP request failed below the HTTP layer
    #[error("Request failed: {0}")]
    Request(String),

    /// Timeout
    #[error("Request timeout: {0}")]
    Timeout(String),
}

impl RelayError {
    /// HTTP status carried by the error, if the provider answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            RelayError::ProviderHttp { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the provider throttled us (HTTP 429)
    pub fn is_rate_limited(&self) -> bool {
        self.status() == Some(429)
    }

    /// Build a response error for a provider
    pub(crate) fn response(provider: ProviderId, message: impl Into<String>) -> Self {
        RelayError::ProviderResponse {
            provider,
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for RelayError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            RelayError::Timeout(err.to_string())
        } else if err.is_connect() {
            RelayError::Request(format!("Connection failed: {}", err))
        } else {
            RelayError::Request(err.to_string())
        }
    }
}

/// Result type alias for chatrelay operations
pub type Result<T> = std::result::Result<T, RelayError>;
